//! Field rules for the record store.
//!
//! This is the one place that decides what a well-formed row looks like. The
//! parser calls into it for the checks that reject a row; `validate_row`
//! reports every deviation for audit tooling, without rewriting anything.

use std::io::Read;

use crate::{
    release::{DateOrder, ParseError, RawRow},
    store::{self, CatalogReadError},
};

/// Fields without which a release cannot be shown at all.
pub const IDENTITY_FIELDS: [&str; 2] = ["artist", "name"];

/// Fields a complete row is expected to carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["artist", "name", "album_art_url", "type", "release_date"];

pub fn field_is_blank(row: &RawRow, field: &str) -> bool {
    let value = match field {
        "artist" => &row.artist,
        "name" => &row.name,
        "album_art_url" => &row.album_art_url,
        "genres" => &row.genres,
        "type" => &row.release_type,
        "release_date" => &row.release_date,
        _ => return true,
    };
    value.trim().is_empty()
}

/// Strictly decode a JSON array of strings.
pub fn decode_json_genres(raw: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).ok()
}

pub fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    ["http://", "https://"].iter().any(|scheme| {
        url.len() > scheme.len()
            && url
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowIssue {
    #[error("expected {expected} columns, found {found}")]
    WrongColumnCount { expected: usize, found: usize },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid album art URL {0:?}")]
    InvalidArtUrl(String),
    #[error("genres are not a JSON array of strings: {0:?}")]
    InvalidGenres(String),
    #[error("invalid release date {0:?}")]
    InvalidDate(String),
}
impl From<ParseError> for RowIssue {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidDate { raw } => RowIssue::InvalidDate(raw),
            ParseError::MissingField { field } => RowIssue::MissingField(field),
            ParseError::WrongColumnCount { expected, found } => {
                RowIssue::WrongColumnCount { expected, found }
            }
        }
    }
}

/// Check a header row against [`RawRow::COLUMNS`]. Column order matters.
pub fn validate_header<'a>(
    fields: impl IntoIterator<Item = &'a str>,
) -> Result<(), CatalogReadError> {
    let fields: Vec<&str> = fields.into_iter().collect();
    if fields.iter().all(|f| f.is_empty()) {
        return Err(CatalogReadError::MissingHeader);
    }
    if fields != RawRow::COLUMNS {
        return Err(CatalogReadError::HeaderMismatch {
            found: fields.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(())
}

/// Every issue with a single row. An empty result means the row is well-formed.
pub fn validate_row(row: &RawRow, order: DateOrder) -> Vec<RowIssue> {
    let mut issues = vec![];

    for field in REQUIRED_FIELDS {
        if field_is_blank(row, field) {
            issues.push(RowIssue::MissingField(field));
        }
    }

    if !field_is_blank(row, "album_art_url") && !is_http_url(&row.album_art_url) {
        issues.push(RowIssue::InvalidArtUrl(row.album_art_url.clone()));
    }

    if !field_is_blank(row, "genres") && decode_json_genres(row.genres.trim()).is_none() {
        issues.push(RowIssue::InvalidGenres(row.genres.clone()));
    }

    if !field_is_blank(row, "release_date") && order.parse(&row.release_date).is_none() {
        issues.push(RowIssue::InvalidDate(row.release_date.clone()));
    }

    issues
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub rows_checked: usize,
    /// `(line, issue)`, in store order.
    pub issues: Vec<(u64, RowIssue)>,
}
impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate a whole store. Header problems are fatal; row problems are collected.
pub fn validate_store(
    reader: impl Read,
    order: DateOrder,
) -> Result<ValidationReport, CatalogReadError> {
    let mut report = ValidationReport::default();
    for (line, row) in store::read_raw_rows(reader)? {
        report.rows_checked += 1;
        match row {
            Ok(row) => report
                .issues
                .extend(validate_row(&row, order).into_iter().map(|issue| (line, issue))),
            Err(err) => report.issues.push((line, err.into())),
        }
    }
    Ok(report)
}
