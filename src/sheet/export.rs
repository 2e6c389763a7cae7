use super::viewer;
use crate::error::{ProcessorError, Result, ResultExt as _};
use crate::table::Scalar;
use polars::prelude::*;
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::{Path, PathBuf};

/// Sheet holding the untouched upload in a two-sheet export.
pub const PRIMARY_SHEET: &str = "PTG";

/// Sheet holding the processed rows in a two-sheet export.
pub const SECONDARY_SHEET: &str = "EA Upload";

const MAX_EXACT_INT: u64 = 1 << 53;

/// Writes a frame as comma-delimited text with a header row and no index
/// column, replacing any existing file at `path`.
///
/// # Errors
///
/// Returns error if the file cannot be created or written.
pub fn export_single(df: &DataFrame, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let mut df = df.clone();
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV file {}", path.display()))
}

/// Writes two frames into one workbook, `primary` on the first named sheet and
/// `secondary` on the second. No index column is written.
///
/// # Errors
///
/// Returns error if a sheet name is invalid, a frame is too wide for a
/// worksheet, or the workbook cannot be saved.
pub fn export_dual(
    primary: &DataFrame,
    secondary: &DataFrame,
    path: &Path,
    sheet_names: [&str; 2],
) -> Result<()> {
    let mut workbook = Workbook::new();
    for (df, name) in [(primary, sheet_names[0]), (secondary, sheet_names[1])] {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_frame(worksheet, df)?;
    }
    workbook.save(path)?;
    Ok(())
}

fn write_frame(worksheet: &mut Worksheet, df: &DataFrame) -> Result<()> {
    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col = u16::try_from(col_idx).map_err(|_| {
            ProcessorError::Spreadsheet(format!("Too many columns for a worksheet: {}", df.width()))
        })?;
        let series = column.as_materialized_series();
        worksheet.write_string(0, col, series.name().as_str())?;

        for row_idx in 0..series.len() {
            let row = u32::try_from(row_idx + 1).map_err(|_| {
                ProcessorError::Spreadsheet(format!("Too many rows for a worksheet: {}", df.height()))
            })?;
            match Scalar::from_any_value(&series.get(row_idx)?) {
                Scalar::Null => {}
                Scalar::Bool(b) => {
                    worksheet.write_boolean(row, col, b)?;
                }
                // Past 2^53 an f64 cell would round the value
                Scalar::Int(v) if v.unsigned_abs() > MAX_EXACT_INT => {
                    worksheet.write_string(row, col, v.to_string())?;
                }
                Scalar::Int(v) => {
                    worksheet.write_number(row, col, v as f64)?;
                }
                Scalar::Float(v) => {
                    worksheet.write_number(row, col, v)?;
                }
                other => {
                    worksheet.write_string(row, col, other.to_string())?;
                }
            }
        }
    }
    Ok(())
}

/// Writes exports into one directory and optionally opens each file afterwards.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    open_after_export: bool,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, open_after_export: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            open_after_export,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// [`export_single`] into the output directory.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written. A failure to
    /// open the file afterwards is not an error.
    pub fn export_single(&self, df: &DataFrame, file_name: &str) -> Result<PathBuf> {
        let path = self.prepare(file_name)?;
        export_single(df, &path)?;
        self.finish(&path);
        Ok(path)
    }

    /// [`export_dual`] into the output directory with the `PTG` / `EA Upload` sheets.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or workbook cannot be written. A failure
    /// to open the file afterwards is not an error.
    pub fn export_dual(
        &self,
        primary: &DataFrame,
        secondary: &DataFrame,
        file_name: &str,
    ) -> Result<PathBuf> {
        let path = self.prepare(file_name)?;
        export_dual(primary, secondary, &path, [PRIMARY_SHEET, SECONDARY_SHEET])?;
        self.finish(&path);
        Ok(path)
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;
        Ok(self.path_for(file_name))
    }

    fn finish(&self, path: &Path) {
        if self.open_after_export {
            viewer::open_best_effort(path);
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(".", true)
    }
}
