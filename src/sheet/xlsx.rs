//! First-worksheet reader for XLSX workbooks.
//!
//! The first row is the header. Each column gets the narrowest type that fits
//! all of its non-empty cells: integers, floats, booleans, or text.

use crate::error::{ProcessorError, Result};
use calamine::{Data, DataType as _, Reader as _, Xlsx, open_workbook_from_rs};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

pub(crate) fn read_first_sheet(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ProcessorError::EmptyInput)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(ProcessorError::EmptyInput);
    };
    let names = header_names(header);

    let body: Vec<&[Data]> = rows
        .filter(|row| row.iter().any(|cell| !is_blank(cell)))
        .collect();

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            Column::from(build_series(name, &cells))
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns).map_err(|e| ProcessorError::MalformedInput(e.to_string()))
}

/// Header names with blanks filled in and duplicates suffixed (`Name`, `Name.1`).
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Data::Empty => format!("Unnamed: {idx}"),
                Data::String(s) if s.trim().is_empty() => format!("Unnamed: {idx}"),
                other => other.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn kind_of(cell: &Data) -> Option<CellKind> {
    match cell {
        _ if is_blank(cell) => None,
        Data::Int(_) => Some(CellKind::Int),
        Data::Float(v) if is_integral(*v) => Some(CellKind::Int),
        Data::Float(_) => Some(CellKind::Float),
        Data::Bool(_) => Some(CellKind::Bool),
        _ => Some(CellKind::Text),
    }
}

fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15
}

fn column_kind(cells: &[&Data]) -> CellKind {
    let mut kind = None;
    for cell in cells {
        let Some(cell_kind) = kind_of(cell) else {
            continue;
        };
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(CellKind::Int | CellKind::Float), CellKind::Int | CellKind::Float) => {
                CellKind::Float
            }
            _ => return CellKind::Text,
        });
    }
    kind.unwrap_or(CellKind::Text)
}

fn build_series(name: &str, cells: &[&Data]) -> Series {
    match column_kind(cells) {
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    Data::Float(v) => Some(*v as i64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells.iter().map(|cell| cell.get_bool()).collect();
            Series::new(name.into(), values)
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells.iter().map(|cell| cell_text(cell)).collect();
            Series::new(name.into(), values)
        }
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    if is_blank(cell) {
        return None;
    }
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_fill_and_dedupe() {
        let header = vec![
            Data::String("Name".to_owned()),
            Data::Empty,
            Data::String("Name".to_owned()),
        ];
        assert_eq!(header_names(&header), vec!["Name", "Unnamed: 1", "Name.1"]);
    }

    #[test]
    fn test_column_kind_widening() {
        let int = Data::Int(3);
        let whole = Data::Float(4.0);
        let frac = Data::Float(4.5);
        let text = Data::String("x".to_owned());
        let empty = Data::Empty;

        assert_eq!(column_kind(&[&int, &whole, &empty]), CellKind::Int);
        assert_eq!(column_kind(&[&int, &frac]), CellKind::Float);
        assert_eq!(column_kind(&[&int, &text]), CellKind::Text);
        assert_eq!(column_kind(&[&empty]), CellKind::Text);
    }

    #[test]
    fn test_build_series_keeps_nulls() {
        let a = Data::Float(1.0);
        let b = Data::Empty;
        let series = build_series("Zip", &[&a, &b]);
        assert_eq!(series.dtype(), &DataType::Int64);
        assert_eq!(series.null_count(), 1);
    }
}
