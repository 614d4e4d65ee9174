//! CSV export with the canonical column order.

use thiserror::Error;

use crate::record::{COLUMNS, SchoolRecord};

/// Errors that can occur while building an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No records have been accumulated; no file is produced.
    #[error("no records to export")]
    NoRecords,

    /// CSV serialization failed.
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Serializes records to UTF-8 CSV bytes: a header row of the canonical
/// column names followed by one row per record, in accumulation order.
///
/// # Errors
///
/// Returns [`ExportError::NoRecords`] for an empty record set; an empty
/// file is never produced.
pub fn write_csv(records: &[SchoolRecord]) -> Result<Vec<u8>, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(record.as_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Appends the `.csv` extension to a requested export filename when
/// missing (case-insensitive check); an empty request falls back to
/// `export`. The name is otherwise left alone so the CLI can pass
/// plain paths through.
#[must_use]
pub fn ensure_csv_filename(requested: &str) -> String {
    let name = requested.trim();
    let name = if name.is_empty() { "export" } else { name };
    if name.to_lowercase().ends_with(".csv") {
        name.to_string()
    } else {
        format!("{name}.csv")
    }
}

/// Reduces a filename to something safe for a Content-Disposition
/// header: the final path component with quotes, separators, and
/// control characters replaced.
#[must_use]
pub fn sanitize_download_filename(name: &str) -> String {
    let component = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        let mapped = match ch {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        };
        out.push(mapped);
    }
    let out = out.trim_matches(|c: char| c == '_' || c.is_whitespace());
    if out.is_empty() {
        "export.csv".to_string()
    } else {
        out.to_string()
    }
}
