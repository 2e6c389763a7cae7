//! Error handling for the sheet processor.
//!
//! Every pipeline stage returns either a complete table or a tagged
//! [`ProcessorError`]. Nothing in the library terminates the process; the caller
//! (the CLI, or a test) decides how to present the failure and stops only the
//! operation that failed.
//!
//! ```
//! use rise_processor::error::ProcessorError;
//!
//! fn describe(err: &ProcessorError) -> String {
//!     match err {
//!         ProcessorError::ColumnNotFound { column, available } => {
//!             format!("missing {column}, have {}", available.join(", "))
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```

use std::fmt;

/// Main error type for processor operations.
#[derive(Debug)]
pub enum ProcessorError {
    /// Declared media type is neither CSV nor XLSX
    UnsupportedFormat(String),

    /// Decoding produced no data rows
    EmptyInput,

    /// The byte content could not be decoded into a table
    MalformedInput(String),

    /// A required column is absent; carries the columns that do exist
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// A timestamp cell could not be parsed
    TimestampParseError { column: String, value: String },

    /// I/O errors (reading sources, writing exports)
    Io(std::io::Error),

    /// Polars errors raised while reshaping a frame
    DataProcessing(String),

    /// Spreadsheet reader/writer errors
    Spreadsheet(String),

    /// Settings or job spec errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl ProcessorError {
    /// Builds a [`ProcessorError::ColumnNotFound`] listing the frame's columns.
    pub fn column_not_found<'a>(
        column: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            available: available.into_iter().map(str::to_owned).collect(),
        }
    }
}

impl fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(kind) => write!(
                f,
                "Unsupported file type '{kind}'. Please upload a CSV or Excel file."
            ),
            Self::EmptyInput => write!(f, "The uploaded file is empty."),
            Self::MalformedInput(msg) => {
                write!(f, "An error occurred while reading the file: {msg}")
            }
            Self::ColumnNotFound { column, available } => write!(
                f,
                "Column '{column}' not found in the file. Available columns: {}",
                available.join(", ")
            ),
            Self::TimestampParseError { column, value } => {
                write!(f, "Could not parse '{value}' in column '{column}' as a timestamp")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Spreadsheet(msg) => write!(f, "Spreadsheet error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ProcessorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<polars::error::PolarsError> for ProcessorError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<calamine::XlsxError> for ProcessorError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ProcessorError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}

impl From<serde_json::Error> for ProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

/// Result type alias for processor operations.
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ProcessorError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: ProcessorError = e.into();
            ProcessorError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: ProcessorError = e.into();
            ProcessorError::Other(format!("{}: {}", f(), err))
        })
    }
}
