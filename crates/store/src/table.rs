//! CSV table I/O — full-file reads and rewrites.
//!
//! Each table is one UTF-8 file with a header row naming each column. The
//! whole file is rewritten on every flush; at the expected table sizes (a few
//! hundred rows) that is cheaper than any incremental scheme and keeps the
//! crash-safety story trivial.

use ordbok_core::error::StoreError;
use ordbok_core::record::{Contact, Suggestion, VerbEntry};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// A row type persisted as one CSV table.
pub(crate) trait TableRow: Serialize + DeserializeOwned + Clone + Send + Sync {
    const NAME: &'static str;
    const HEADERS: &'static [&'static str];
}

impl TableRow for VerbEntry {
    const NAME: &'static str = "dictionary";
    const HEADERS: &'static [&'static str] =
        &["infinitive", "present", "past", "pastParticiple", "translation"];
}

impl TableRow for Suggestion {
    const NAME: &'static str = "suggestions";
    const HEADERS: &'static [&'static str] = &[
        "infinitive",
        "present",
        "past",
        "pastParticiple",
        "translation",
        "submitterId",
        "submitterName",
        "contactInfo",
    ];
}

impl TableRow for Contact {
    const NAME: &'static str = "contacts";
    const HEADERS: &'static [&'static str] =
        &["userId", "username", "contactInfo", "lastActiveTimestamp"];
}

/// Read a table from disk. An absent file is not an error: the file is
/// created with the canonical header and an empty row set is returned.
/// Any other read or decode failure is unrecoverable for this table.
pub(crate) fn load_or_create<T: TableRow>(path: &Path) -> Result<Vec<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(table = T::NAME, path = %path.display(), "table file absent, creating empty");
            write_table::<T>(path, &[])?;
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(StoreError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.map_err(|e| {
            StoreError::Corrupt(format!("bad row in {}: {e}", path.display()))
        })?;
        rows.push(row);
    }
    debug!(table = T::NAME, rows = rows.len(), "table loaded");
    Ok(rows)
}

/// Rewrite the whole table, header first, in insertion order.
pub(crate) fn write_table<T: TableRow>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::Storage(format!("failed to create data directory: {e}"))
        })?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(T::HEADERS)
        .map_err(|e| StoreError::Storage(format!("failed to encode header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| StoreError::Storage(format!("failed to encode row: {e}")))?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| StoreError::Storage(format!("failed to finish table: {e}")))?;

    std::fs::write(path, data).map_err(|e| {
        StoreError::Storage(format!("failed to write {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(infinitive: &str) -> VerbEntry {
        VerbEntry::new(infinitive, "p", "pa", "pp", "t")
    }

    #[test]
    fn absent_file_creates_empty_table_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verbs.csv");

        let rows: Vec<VerbEntry> = load_or_create(&path).unwrap();
        assert!(rows.is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.trim(),
            "infinitive,present,past,pastParticiple,translation"
        );
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verbs.csv");

        let rows = vec![entry("å danse"), entry("å legge"), entry("å være")];
        write_table(&path, &rows).unwrap();
        let reloaded: Vec<VerbEntry> = load_or_create(&path).unwrap();
        assert_eq!(reloaded, rows);
    }

    #[test]
    fn embedded_comma_in_field_round_trips() {
        // The csv writer quotes embedded delimiters, so hand-edited or
        // promoted rows with commas in free text survive a reload.
        let dir = tempdir().unwrap();
        let path = dir.path().join("verbs.csv");

        let rows = vec![VerbEntry::new("å gå", "går", "gikk", "har gått", "to go, to walk")];
        write_table(&path, &rows).unwrap();
        let reloaded: Vec<VerbEntry> = load_or_create(&path).unwrap();
        assert_eq!(reloaded[0].translation, "to go, to walk");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verbs.csv");
        std::fs::write(&path, "infinitive,present\nnot,enough,columns,here,at,all\n").unwrap();

        let result: Result<Vec<VerbEntry>, _> = load_or_create(&path);
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn suggestion_headers_carry_submitter_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suggestions.csv");
        let rows: Vec<Suggestion> = load_or_create(&path).unwrap();
        assert!(rows.is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("submitterId,submitterName,contactInfo"));
    }
}
