//! Reading and appending the tabular record store.

use std::{
    borrow::Cow,
    io::{Read, Seek as _, SeekFrom, Write as _},
    path::Path,
};

use crate::{
    release::{DateOrder, ParseError, RawRow, Release, RowOutcome, parse_row},
    validate,
};

/// Anything that makes the store as a whole unreadable. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum CatalogReadError {
    #[error("failed to read record store: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record store: {0}")]
    Csv(#[from] csv::Error),
    #[error("record store has no header row")]
    MissingHeader,
    #[error(
        "record store header {found:?} does not match {expected:?}",
        expected = RawRow::COLUMNS
    )]
    HeaderMismatch { found: Vec<String> },
}

/// Read every data row, keyed by its 1-based line number. Rows with the wrong
/// number of cells are returned as errors rather than aborting the read, and
/// cells that are not valid UTF-8 are decoded with replacement characters.
pub fn read_raw_rows(
    reader: impl Read,
) -> Result<Vec<(u64, Result<RawRow, ParseError>)>, CatalogReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    validate::validate_header(reader.headers()?)?;

    let mut rows = vec![];
    for record in reader.byte_records() {
        let record = record?;
        if record.iter().all(<[u8]>::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, csv::Position::line);
        let fields: Vec<Cow<str>> = record.iter().map(String::from_utf8_lossy).collect();
        if fields.iter().any(|field| matches!(field, Cow::Owned(_))) {
            tracing::warn!(line, "row is not valid UTF-8; undecodable bytes were replaced");
        }
        rows.push((line, RawRow::from_fields(fields.iter().map(|f| f.as_ref()))));
    }
    Ok(rows)
}

/// The store after parsing: one outcome per data row, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCatalog {
    pub outcomes: Vec<RowOutcome>,
}
impl ParsedCatalog {
    pub fn releases(&self) -> impl Iterator<Item = &Release> {
        self.outcomes.iter().filter_map(RowOutcome::release)
    }

    pub fn into_releases(self) -> Vec<Release> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                RowOutcome::Parsed(parsed) => Some(parsed.release),
                RowOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Skipped { .. }))
            .count()
    }
}

/// Read and parse the whole store. Bad rows are skipped with a diagnostic;
/// only a store-level failure is returned as an error.
pub fn read_catalog(
    reader: impl Read,
    order: DateOrder,
) -> Result<ParsedCatalog, CatalogReadError> {
    let mut catalog = ParsedCatalog::default();
    for (line, row) in read_raw_rows(reader)? {
        let outcome = match row.and_then(|row| parse_row(&row, order)) {
            Ok(parsed) => {
                tracing::info!(
                    line,
                    "parsed date {} for {}",
                    parsed.release.release_date(),
                    parsed.release.heading()
                );
                RowOutcome::Parsed(parsed)
            }
            Err(reason) => {
                tracing::warn!(line, "skipping row: {reason}");
                RowOutcome::Skipped { line, reason }
            }
        };
        catalog.outcomes.push(outcome);
    }
    Ok(catalog)
}

/// Append rows to the store at `path`, creating it with a header if it does
/// not exist yet. Cells containing commas or quotes are quoted. A store whose
/// last line lacks a terminator gets one before the first new row.
pub fn append_rows(path: &Path, rows: &[RawRow]) -> Result<(), csv::Error> {
    let needs_header = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    if !needs_header && !ends_with_newline(&mut file)? {
        file.write_all(b"\n")?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if needs_header {
        writer.write_record(RawRow::COLUMNS)?;
    }
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer.flush()?;
    Ok(())
}

fn ends_with_newline(file: &mut std::fs::File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
