use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::validate;

/// One row of the record store, exactly as read: every cell is raw text and
/// absent cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub artist: String,
    pub name: String,
    pub album_art_url: String,
    pub genres: String,
    #[serde(rename = "type")]
    pub release_type: String,
    pub release_date: String,
}
impl RawRow {
    /// The store's header, in column order.
    pub const COLUMNS: [&str; 6] = [
        "artist",
        "name",
        "album_art_url",
        "genres",
        "type",
        "release_date",
    ];

    /// Build a row from positional cells. Cells are trimmed.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<Self, ParseError> {
        let fields: Vec<&str> = fields.into_iter().map(str::trim).collect();
        let [artist, name, album_art_url, genres, release_type, release_date] = fields[..] else {
            return Err(ParseError::WrongColumnCount {
                expected: Self::COLUMNS.len(),
                found: fields.len(),
            });
        };
        Ok(Self {
            artist: artist.to_string(),
            name: name.to_string(),
            album_art_url: album_art_url.to_string(),
            genres: genres.to_string(),
            release_type: release_type.to_string(),
            release_date: release_date.to_string(),
        })
    }

    /// The cells in column order.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.artist,
            &self.name,
            &self.album_art_url,
            &self.genres,
            &self.release_type,
            &self.release_date,
        ]
    }
}

/// The order of day and month in the store's `release_date` column.
///
/// The upstream export writes dates day-first (`DD/MM/YYYY`). That is the
/// default and is never inferred from the data: `03/04/2024` is the 3rd of
/// April unless the store is explicitly configured as month-first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `DD/MM/YYYY`
    #[default]
    DayFirst,
    /// `MM/DD/YYYY`
    MonthFirst,
}
impl DateOrder {
    pub const SEPARATOR: char = '/';

    /// Parse a date cell. Returns `None` for absent, non-numeric or
    /// out-of-range values.
    pub fn parse(self, raw: &str) -> Option<NaiveDate> {
        let mut parts = raw.trim().split(Self::SEPARATOR);
        let (first, second, year) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let number = |s: &str| -> Option<u32> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse().ok()
        };
        let (first, second, year) = (number(first)?, number(second)?, number(year)?);
        let (day, month) = match self {
            DateOrder::DayFirst => (first, second),
            DateOrder::MonthFirst => (second, first),
        };
        NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
    }

    /// Format a date the way the store expects to read it back.
    pub fn format(self, date: NaiveDate) -> String {
        let (first, second) = match self {
            DateOrder::DayFirst => (date.day(), date.month()),
            DateOrder::MonthFirst => (date.month(), date.day()),
        };
        format!("{first:02}/{second:02}/{:04}", date.year())
    }
}

/// How the `genres` cell was encoded. Only informational: every encoding
/// yields a usable genre list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreEncoding {
    /// A JSON array of strings, as written by ingestion.
    JsonArray,
    /// Anything else, split on commas.
    CommaList,
    /// Blank cell.
    Empty,
}

/// Decode a `genres` cell. Tries a strict JSON array first and falls back to
/// splitting on `,`; never fails.
pub fn parse_genres(raw: &str) -> (Vec<String>, GenreEncoding) {
    let raw = raw.trim();
    if raw.is_empty() {
        return (vec![], GenreEncoding::Empty);
    }
    if let Some(genres) = validate::decode_json_genres(raw) {
        return (genres, GenreEncoding::JsonArray);
    }

    let genres = raw
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if genres.is_empty() {
        // Only separators; keep the raw text so nothing is silently lost.
        return (vec![raw.to_string()], GenreEncoding::CommaList);
    }
    (genres, GenreEncoding::CommaList)
}

/// A single catalog entry that made it through parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    artist: String,
    name: String,
    album_art_url: String,
    genres: Vec<String>,
    release_type: String,
    release_date: NaiveDate,
    release_date_text: String,
}
impl Release {
    /// Construct a release dated `release_date`, with no art, genres or type.
    pub fn new(
        artist: impl Into<String>,
        name: impl Into<String>,
        release_date: NaiveDate,
    ) -> Self {
        Self {
            artist: artist.into(),
            name: name.into(),
            album_art_url: String::new(),
            genres: vec![],
            release_type: String::new(),
            release_date,
            release_date_text: DateOrder::default().format(release_date),
        }
    }

    pub fn with_album_art_url(mut self, url: impl Into<String>) -> Self {
        self.album_art_url = url.into();
        self
    }

    pub fn with_genres(mut self, genres: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_release_type(mut self, release_type: impl Into<String>) -> Self {
        self.release_type = release_type.into();
        self
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// May be empty; the composer skips releases whose art cannot be loaded.
    pub fn album_art_url(&self) -> &str {
        &self.album_art_url
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn release_type(&self) -> &str {
        &self.release_type
    }

    pub fn release_date(&self) -> NaiveDate {
        self.release_date
    }

    /// The date cell as it appeared in the store.
    pub fn release_date_text(&self) -> &str {
        &self.release_date_text
    }

    /// `"{artist} - {name}"`
    pub fn heading(&self) -> String {
        format!("{} - {}", self.artist, self.name)
    }

    /// `"{type} ({genre, genre})"`
    pub fn summary(&self) -> String {
        format!("{} ({})", self.release_type, self.genres.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid release date {raw:?}")]
    InvalidDate { raw: String },
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("expected {expected} columns, found {found}")]
    WrongColumnCount { expected: usize, found: usize },
}

/// A successfully parsed row, with a note on how its genres were encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub release: Release,
    pub genre_encoding: GenreEncoding,
}

/// The per-row result of reading the store. A skipped row never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Parsed(ParsedRow),
    Skipped {
        /// 1-based line in the store, header included.
        line: u64,
        reason: ParseError,
    },
}
impl RowOutcome {
    pub fn release(&self) -> Option<&Release> {
        match self {
            RowOutcome::Parsed(parsed) => Some(&parsed.release),
            RowOutcome::Skipped { .. } => None,
        }
    }
}

/// Turn a raw row into a [`Release`].
pub fn parse_row(row: &RawRow, order: DateOrder) -> Result<ParsedRow, ParseError> {
    let release_date = order
        .parse(&row.release_date)
        .ok_or_else(|| ParseError::InvalidDate {
            raw: row.release_date.clone(),
        })?;

    for field in validate::IDENTITY_FIELDS {
        if validate::field_is_blank(row, field) {
            return Err(ParseError::MissingField { field });
        }
    }

    let (genres, genre_encoding) = parse_genres(&row.genres);
    Ok(ParsedRow {
        release: Release {
            artist: row.artist.trim().to_string(),
            name: row.name.trim().to_string(),
            album_art_url: row.album_art_url.trim().to_string(),
            genres,
            release_type: row.release_type.trim().to_string(),
            release_date,
            release_date_text: row.release_date.trim().to_string(),
        },
        genre_encoding,
    })
}
