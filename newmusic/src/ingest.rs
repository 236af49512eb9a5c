//! Pulling album metadata from the catalog into the record store.

use anyhow::Context as _;
use chrono::NaiveDate;
use newmusic_catalog::{Album, Client, ReleaseDatePrecision, album_id_from_url};
use newmusic_core::{DateOrder, RawRow, ValidationReport, store, validate_store};

use crate::config::Config;

/// Album IDs from a list of share URLs, one per line. Blank lines and lines
/// starting with `#` are ignored.
pub fn album_ids(list: &str) -> Vec<&str> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(album_id_from_url)
        .collect()
}

/// Interpret the catalog's `YYYY[-MM[-DD]]` date at the given precision.
/// Missing components default to the first month or day.
pub fn catalog_date(raw: &str, precision: ReleaseDatePrecision) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('-').map(|part| part.parse::<u32>().ok());
    let year = parts.next()??;
    let month = match precision {
        ReleaseDatePrecision::Year => 1,
        _ => parts.next()??,
    };
    let day = match precision {
        ReleaseDatePrecision::Day => parts.next()??,
        _ => 1,
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

pub fn album_to_row(album: &Album, order: DateOrder) -> RawRow {
    let release_date = match catalog_date(&album.release_date, album.release_date_precision) {
        Some(date) => order.format(date),
        None => {
            tracing::warn!(
                album = %album.id,
                "keeping unrecognised release date {:?}",
                album.release_date
            );
            album.release_date.clone()
        }
    };
    let genres = if album.genres.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&album.genres).unwrap_or_default()
    };

    RawRow {
        artist: album.artist_names(),
        name: album.name.clone(),
        album_art_url: album.cover_url().unwrap_or_default().to_string(),
        genres,
        release_type: album.album_type.clone(),
        release_date,
    }
}

/// Fetch every album in the list, append what was found to the store, and
/// validate the result. Returns `None` without touching the store when no
/// album could be fetched.
pub async fn run(config: &Config) -> anyhow::Result<Option<ValidationReport>> {
    let list_path = &config.paths.album_list;
    let list = std::fs::read_to_string(list_path)
        .with_context(|| format!("failed to read album list {}", list_path.display()))?;
    let ids = album_ids(&list);
    tracing::info!("fetching {} albums from {}", ids.len(), list_path.display());

    if config.catalog.token.is_empty() {
        tracing::warn!(
            "no catalog token configured; set catalog.token or {}",
            Config::TOKEN_ENV
        );
    }
    let client = Client::new(
        config.catalog.base_url.clone(),
        config.catalog.token.clone(),
        config.catalog.market.clone(),
    );

    let fetched = futures::future::join_all(ids.iter().map(|id| client.get_album(*id))).await;
    let mut rows = vec![];
    for (id, result) in ids.iter().zip(fetched) {
        match result {
            Ok(album) => {
                tracing::info!(album = %id, "fetched {} - {}", album.artist_names(), album.name);
                rows.push(album_to_row(&album, config.render.date_order));
            }
            Err(e) => tracing::warn!(album = %id, "failed to fetch album: {e}"),
        }
    }

    if rows.is_empty() {
        tracing::info!("no new albums fetched");
        return Ok(None);
    }

    let records = &config.paths.records;
    store::append_rows(records, &rows)
        .with_context(|| format!("failed to append to {}", records.display()))?;
    tracing::info!("appended {} rows to {}", rows.len(), records.display());

    let file = std::fs::File::open(records)
        .with_context(|| format!("failed to open {}", records.display()))?;
    Ok(Some(validate_store(file, config.render.date_order)?))
}

#[cfg(test)]
mod tests {
    use newmusic_catalog::{Image, SimplifiedArtist};

    use super::*;

    fn album() -> Album {
        Album {
            id: "4aawyAB9vmqN3uQ7FjRGTy".to_string(),
            name: "ten".to_string(),
            artists: vec![
                SimplifiedArtist {
                    id: "1".to_string(),
                    name: "Fred again..".to_string(),
                },
                SimplifiedArtist {
                    id: "2".to_string(),
                    name: "Jozzy".to_string(),
                },
            ],
            images: vec![Image {
                url: "https://i.scdn.co/image/640".to_string(),
                width: Some(640),
                height: Some(640),
            }],
            genres: vec![],
            album_type: "single".to_string(),
            release_date: "2024-10-11".to_string(),
            release_date_precision: ReleaseDatePrecision::Day,
        }
    }

    #[tokio::test]
    async fn test_nothing_fetched_leaves_store_alone() {
        let dir = std::env::temp_dir().join(format!("newmusic-ingest-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = Config::default();
        config.catalog.base_url = "http://127.0.0.1:9".to_string();
        config.paths.album_list = dir.join("input.txt");
        config.paths.records = dir.join("input.csv");

        std::fs::write(&config.paths.album_list, "# nothing yet\n").unwrap();
        assert!(run(&config).await.unwrap().is_none());
        assert!(!config.paths.records.exists());

        std::fs::write(&config.paths.album_list, "https://open.spotify.com/album/abc\n").unwrap();
        assert!(run(&config).await.unwrap().is_none());
        assert!(!config.paths.records.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_album_ids() {
        let list = "https://open.spotify.com/album/abc?si=1\n\
                    \n\
                    # skipped\n\
                    https://open.spotify.com/album/def/\n\
                    ghi\n";
        assert_eq!(album_ids(list), ["abc", "def", "ghi"]);
    }

    #[test]
    fn test_catalog_date() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(
            catalog_date("2024-10-11", ReleaseDatePrecision::Day),
            date(2024, 10, 11)
        );
        assert_eq!(
            catalog_date("2024-10", ReleaseDatePrecision::Month),
            date(2024, 10, 1)
        );
        assert_eq!(catalog_date("1999", ReleaseDatePrecision::Year), date(1999, 1, 1));
        assert_eq!(catalog_date("2024-10", ReleaseDatePrecision::Day), None);
        assert_eq!(catalog_date("2024-02-30", ReleaseDatePrecision::Day), None);
        assert_eq!(catalog_date("", ReleaseDatePrecision::Year), None);
    }

    #[test]
    fn test_album_to_row() {
        let row = album_to_row(&album(), DateOrder::DayFirst);
        assert_eq!(
            row,
            RawRow {
                artist: "Fred again.., Jozzy".to_string(),
                name: "ten".to_string(),
                album_art_url: "https://i.scdn.co/image/640".to_string(),
                genres: String::new(),
                release_type: "single".to_string(),
                release_date: "11/10/2024".to_string(),
            }
        );
        assert!(newmusic_core::validate_row(&row, DateOrder::DayFirst).is_empty());
    }

    #[test]
    fn test_album_to_row_genres_and_odd_dates() {
        let mut album = album();
        album.genres = vec!["house".to_string(), "say \"hi\"".to_string()];
        album.release_date = "2024".to_string();
        album.release_date_precision = ReleaseDatePrecision::Year;
        album.images.clear();

        let row = album_to_row(&album, DateOrder::MonthFirst);
        assert_eq!(row.genres, r#"["house","say \"hi\""]"#);
        assert_eq!(
            newmusic_core::validate::decode_json_genres(&row.genres),
            Some(album.genres.clone())
        );
        assert_eq!(row.release_date, "01/01/2024");
        assert_eq!(row.album_art_url, "");

        album.release_date = "soon".to_string();
        assert_eq!(album_to_row(&album, DateOrder::DayFirst).release_date, "soon");
    }
}
