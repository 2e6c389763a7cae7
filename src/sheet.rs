//! Reading and writing sheets.
//!
//! [`loader`] turns an uploaded byte stream into a [`polars::prelude::DataFrame`]
//! and [`export`] writes frames back out as CSV or as a multi-sheet workbook.
//! Neither module logs; callers report progress and errors themselves.

pub mod export;
pub mod loader;
mod viewer;
mod xlsx;

pub use export::{Exporter, PRIMARY_SHEET, SECONDARY_SHEET, export_dual, export_single};
pub use loader::{CSV_MIME, MediaType, XLSX_MIME, load, load_declared, load_path};
