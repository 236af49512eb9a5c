use serde::{Deserialize, Serialize};

use crate::{Client, ClientResult};

/// An artist as embedded in an album response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    /// The artist ID
    #[serde(default)]
    pub id: String,
    /// The artist name
    pub name: String,
}

/// A cover image, in one of several sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// The source URL of the image
    pub url: String,
    /// The image width in pixels, if known
    #[serde(default)]
    pub width: Option<u32>,
    /// The image height in pixels, if known
    #[serde(default)]
    pub height: Option<u32>,
}

/// How much of `release_date` is meaningful.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseDatePrecision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    #[default]
    Day,
}

/// Represents a full album object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    /// The album ID
    pub id: String,
    /// The album name
    pub name: String,
    /// The artists of the album
    pub artists: Vec<SimplifiedArtist>,
    /// The cover art, widest first
    #[serde(default)]
    pub images: Vec<Image>,
    /// The genres the album is associated with; frequently empty
    #[serde(default)]
    pub genres: Vec<String>,
    /// `album`, `single` or `compilation`
    pub album_type: String,
    /// The release date, e.g. `1981-12-15`; may be truncated according to `release_date_precision`
    pub release_date: String,
    /// The precision of `release_date`
    #[serde(default)]
    pub release_date_precision: ReleaseDatePrecision,
}
impl Album {
    /// All artist names, joined for display.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The URL of the first (largest) cover image, if any.
    pub fn cover_url(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }
}

/// Extract the album ID from a share URL such as
/// `https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=abc`.
/// A bare ID is returned unchanged.
pub fn album_id_from_url(url: &str) -> Option<&str> {
    let url = url.trim();
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}

/// Album-related endpoints.
impl Client {
    /// Get a specific album.
    pub async fn get_album(&self, id: impl Into<String>) -> ClientResult<Album> {
        let id = id.into();
        self.request::<Album>(&format!("albums/{id}"), &[("market", self.market.clone())])
            .await
    }
}
