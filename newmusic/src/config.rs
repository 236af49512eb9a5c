use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use newmusic_core::{CardComposer, CardGeometry, CardStyle, DateOrder, RenderSettings, Rgb8};
use newmusic_raster::FontSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub catalog: Catalog,
    pub paths: Paths,
    pub render: Render,
}
impl Config {
    pub const FILENAME: &str = "config.toml";
    /// Takes precedence over `catalog.token` when set and non-empty.
    pub const TOKEN_ENV: &str = "SPOTIFY_API_TOKEN";

    /// Load `path`, falling back to defaults if it doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found at {}, using defaults", path.display());
                Config::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        config.override_token(std::env::var(Self::TOKEN_ENV).ok());
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn override_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.catalog.token = token;
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            date_order: self.render.date_order,
            art_fetch_concurrency: self.render.art_fetch_concurrency,
            art_fetch_timeout: Duration::from_secs(self.render.art_fetch_timeout_secs),
            output_dir: self.paths.output_dir.clone(),
        }
    }

    pub fn composer(&self) -> CardComposer {
        CardComposer::new(
            self.render.geometry.clone(),
            CardStyle {
                title: self.render.title.clone(),
                background: self.render.background,
                text_color: self.render.text_color,
            },
        )
    }

    pub fn load_fonts(&self) -> anyhow::Result<FontSet> {
        FontSet::load(&self.render.font_path, &self.render.bold_font_path)
            .context("failed to load card fonts; set render.font_path and render.bold_font_path")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Catalog {
    pub token: String,
    pub market: String,
    pub base_url: String,
}
impl Default for Catalog {
    fn default() -> Self {
        Self {
            token: String::new(),
            market: "AU".to_string(),
            base_url: newmusic_catalog::Client::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Paths {
    /// The record store.
    pub records: PathBuf,
    /// Album URLs to ingest, one per line.
    pub album_list: PathBuf,
    pub output_dir: PathBuf,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            records: PathBuf::from("input.csv"),
            album_list: PathBuf::from("input.txt"),
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Render {
    pub font_path: PathBuf,
    pub bold_font_path: PathBuf,
    pub art_fetch_concurrency: usize,
    pub art_fetch_timeout_secs: u64,
    pub date_order: DateOrder,
    pub title: String,
    pub background: Rgb8,
    pub text_color: Rgb8,
    pub geometry: CardGeometry,
}
impl Default for Render {
    fn default() -> Self {
        let (font_path, bold_font_path) = FontSet::default_paths();
        let style = CardStyle::default();
        Self {
            font_path,
            bold_font_path,
            art_fetch_concurrency: 4,
            art_fetch_timeout_secs: 10,
            date_order: DateOrder::default(),
            title: style.title,
            background: style.background,
            text_color: style.text_color,
            geometry: CardGeometry::default(),
        }
    }
}
