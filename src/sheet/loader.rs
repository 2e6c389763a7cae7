use super::xlsx;
use crate::error::{ProcessorError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Declared media type for delimited text uploads.
pub const CSV_MIME: &str = "text/csv";

/// Declared media type for Excel workbooks.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The two upload formats the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Csv,
    Xlsx,
}

impl MediaType {
    /// Validates a declared MIME type against the two supported values.
    pub fn from_mime(mime: &str) -> Result<Self> {
        match mime {
            CSV_MIME => Ok(Self::Csv),
            XLSX_MIME => Ok(Self::Xlsx),
            other => Err(ProcessorError::UnsupportedFormat(other.to_owned())),
        }
    }

    /// Declares the media type of a file on disk from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(ProcessorError::UnsupportedFormat(format!(
                "{} (extension '{ext}')",
                path.display()
            ))),
        }
    }
}

/// Decodes an uploaded byte stream into a frame.
///
/// # Errors
///
/// - [`ProcessorError::EmptyInput`] if decoding yields zero rows
/// - [`ProcessorError::MalformedInput`] if the bytes cannot be decoded
pub fn load(bytes: &[u8], media_type: MediaType) -> Result<DataFrame> {
    let df = match media_type {
        MediaType::Csv => read_csv(bytes)?,
        MediaType::Xlsx => xlsx::read_first_sheet(bytes)?,
    };

    if df.height() == 0 {
        return Err(ProcessorError::EmptyInput);
    }
    Ok(df)
}

/// Same as [`load`], with the media type given as a MIME string.
///
/// # Errors
///
/// Fails with [`ProcessorError::UnsupportedFormat`] for any type other than
/// [`CSV_MIME`] or [`XLSX_MIME`], otherwise as [`load`].
pub fn load_declared(bytes: &[u8], declared_type: &str) -> Result<DataFrame> {
    load(bytes, MediaType::from_mime(declared_type)?)
}

/// Reads a file from disk, declaring its type from the extension.
///
/// # Errors
///
/// Fails with [`ProcessorError::Io`] if the file cannot be read, otherwise as
/// [`load`].
pub fn load_path(path: &Path) -> Result<DataFrame> {
    let media_type = MediaType::from_path(path)?;
    let bytes = std::fs::read(path)?;
    load(&bytes, media_type)
}

fn read_csv(bytes: &[u8]) -> Result<DataFrame> {
    // No header line at all: nothing to parse
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ProcessorError::EmptyInput);
    }

    CsvReadOptions::default()
        .with_has_header(true)
        // Scan every row so a late text value widens the column instead of failing
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| ProcessorError::MalformedInput(e.to_string()))
}
