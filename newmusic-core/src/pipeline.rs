//! One end-to-end run: record store in, card file out.

use std::{
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDate;

use crate::{
    art::{ArtFetcher, prefetch_art},
    compose::{CardComposer, CardReport},
    release::{DateOrder, Release},
    store::{CatalogReadError, ParsedCatalog, read_catalog},
    surface::{Surface, SurfaceError},
    util,
    window::DateWindow,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub date_order: DateOrder,
    pub art_fetch_concurrency: usize,
    pub art_fetch_timeout: Duration,
    pub output_dir: PathBuf,
}
impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            date_order: DateOrder::DayFirst,
            art_fetch_concurrency: 4,
            art_fetch_timeout: Duration::from_secs(10),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Failures that abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Catalog(#[from] CatalogReadError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing was released in the window; no file was written.
    NoReleases { catalog: ParsedCatalog },
    Rendered {
        catalog: ParsedCatalog,
        selected: Vec<Release>,
        card: CardReport,
        file_name: String,
        path: PathBuf,
    },
}

/// Parse `records`, select the week ending `today`, fetch art, lay the card out
/// on `surface`, and write it to `settings.output_dir`.
pub async fn render_card<S: Surface + ?Sized>(
    records: impl Read,
    today: NaiveDate,
    fetcher: &impl ArtFetcher,
    composer: &CardComposer,
    surface: &mut S,
    settings: &RenderSettings,
) -> Result<RunOutcome, PipelineError> {
    let catalog = read_catalog(records, settings.date_order)?;

    let window = DateWindow::ending(today);
    let selected = window.select(catalog.releases());
    tracing::info!(
        "{} of {} releases fall between {} and {} ({} rows skipped)",
        selected.len(),
        catalog.outcomes.len() - catalog.skipped_count(),
        window.start(),
        window.end(),
        catalog.skipped_count()
    );
    if selected.is_empty() {
        tracing::info!("no releases found for the previous week");
        return Ok(RunOutcome::NoReleases { catalog });
    }

    let art = prefetch_art(
        fetcher,
        &selected,
        settings.art_fetch_concurrency,
        settings.art_fetch_timeout,
    )
    .await;
    let card = composer.compose(&selected, &art, surface, today);

    let file_name = util::card_file_name(today, surface.file_extension());
    let path = settings.output_dir.join(&file_name);
    let bytes = surface.encode()?;
    write_output(&settings.output_dir, &path, &bytes).await?;
    tracing::info!(
        "rendered {} releases ({} skipped) to {}",
        card.rendered_count(),
        card.skipped_count(),
        path.display()
    );

    Ok(RunOutcome::Rendered {
        catalog,
        selected,
        card,
        file_name,
        path,
    })
}

async fn write_output(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let output_error = |source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(output_error)?;
    tokio::fs::write(path, bytes).await.map_err(output_error)
}

#[cfg(test)]
mod tests {
    use crate::{
        art::AssetLoadError,
        compose::ReleaseOutcome,
        surface::RecordingSurface,
    };

    use super::*;

    struct SolidArt;
    impl ArtFetcher for SolidArt {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetLoadError> {
            if url.contains("broken") {
                return Err(AssetLoadError::Status {
                    url: url.to_string(),
                    status: 500,
                });
            }
            let image = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255]));
            let mut buffer = std::io::Cursor::new(Vec::new());
            image
                .write_to(&mut buffer, image::ImageFormat::Png)
                .map_err(|e| AssetLoadError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(buffer.into_inner())
        }
    }

    const STORE: &str = "artist,name,album_art_url,genres,type,release_date\n\
        Today,Now,https://art/now.jpg,\"[\"\"Pop\"\"]\",single,11/10/2024\n\
        Recent,Three Days,https://art/three.jpg,Rock,album,08/10/2024\n\
        Old,Ten Days,https://art/ten.jpg,Jazz,album,01/10/2024\n\
        Broken,Bad Date,https://art/bad.jpg,,album,10-10-2024\n";

    fn settings(name: &str) -> RenderSettings {
        RenderSettings {
            output_dir: std::env::temp_dir().join(format!(
                "newmusic-pipeline-{name}-{}",
                std::process::id()
            )),
            ..RenderSettings::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 11).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let settings = settings("e2e");
        let mut surface = RecordingSurface::new(1080, 2500);
        let outcome = render_card(
            STORE.as_bytes(),
            today(),
            &SolidArt,
            &CardComposer::default(),
            &mut surface,
            &settings,
        )
        .await
        .unwrap();

        let RunOutcome::Rendered {
            catalog,
            selected,
            card,
            file_name,
            path,
        } = outcome
        else {
            panic!("expected a rendered card");
        };
        assert_eq!(catalog.skipped_count(), 1);
        let names: Vec<_> = selected.iter().map(Release::name).collect();
        assert_eq!(names, ["Now", "Three Days"]);
        assert_eq!(file_name, "new-releases-20241011.json");
        assert_eq!(card.rendered_count(), 2);

        let mut previous = 220.0;
        for outcome in &card.outcomes {
            let ReleaseOutcome::Rendered { start, end } = outcome else {
                panic!("expected every release to render");
            };
            assert_eq!(start.y(), previous);
            assert!(end.y() > start.y());
            previous = end.y();
        }

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, surface.encode().unwrap());
        std::fs::remove_dir_all(&settings.output_dir).unwrap();
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let settings = settings("idem");
        let mut runs = vec![];
        for _ in 0..2 {
            let mut surface = RecordingSurface::new(1080, 2500);
            let RunOutcome::Rendered { file_name, path, .. } = render_card(
                STORE.as_bytes(),
                today(),
                &SolidArt,
                &CardComposer::default(),
                &mut surface,
                &settings,
            )
            .await
            .unwrap()
            else {
                panic!("expected a rendered card");
            };
            runs.push((file_name, std::fs::read(path).unwrap()));
        }
        assert_eq!(runs[0], runs[1]);
        std::fs::remove_dir_all(&settings.output_dir).unwrap();
    }

    #[tokio::test]
    async fn test_skipped_art_does_not_abort() {
        let settings = settings("skip");
        let store = "artist,name,album_art_url,genres,type,release_date\n\
            A,Fine,https://art/a.jpg,,album,11/10/2024\n\
            B,Broken,https://art/broken.jpg,,album,11/10/2024\n";
        let mut surface = RecordingSurface::new(1080, 2500);
        let RunOutcome::Rendered { card, .. } = render_card(
            store.as_bytes(),
            today(),
            &SolidArt,
            &CardComposer::default(),
            &mut surface,
            &settings,
        )
        .await
        .unwrap()
        else {
            panic!("expected a rendered card");
        };
        assert_eq!(card.rendered_count(), 1);
        assert!(matches!(card.outcomes[1], ReleaseOutcome::Skipped { .. }));
        std::fs::remove_dir_all(&settings.output_dir).unwrap();
    }

    #[tokio::test]
    async fn test_no_releases_writes_nothing() {
        let settings = settings("empty");
        let mut surface = RecordingSurface::new(1080, 2500);
        let outcome = render_card(
            STORE.as_bytes(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            &SolidArt,
            &CardComposer::default(),
            &mut surface,
            &settings,
        )
        .await
        .unwrap();
        assert!(matches!(outcome, RunOutcome::NoReleases { .. }));
        assert!(surface.ops().is_empty());
        assert!(!settings.output_dir.exists());
    }

    #[tokio::test]
    async fn test_unreadable_store_is_fatal() {
        let settings = settings("fatal");
        let mut surface = RecordingSurface::new(1080, 2500);
        let result = render_card(
            "not,a,header\n".as_bytes(),
            today(),
            &SolidArt,
            &CardComposer::default(),
            &mut surface,
            &settings,
        )
        .await;
        assert!(matches!(
            result,
            Err(PipelineError::Catalog(CatalogReadError::HeaderMismatch { .. }))
        ));
    }
}
