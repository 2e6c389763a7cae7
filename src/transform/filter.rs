use crate::error::Result;
use crate::table::{Blocklist, require_column, scalars};
use polars::prelude::*;

/// Output of [`filter_sort`] with the row counts shown to the user.
#[derive(Debug, Clone)]
pub struct Filtered {
    pub frame: DataFrame,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl Filtered {
    pub fn rows_removed(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// Drops every row whose `column` value is in `blocklist`. Row order is kept.
///
/// # Errors
///
/// Fails with `ColumnNotFound` if `column` is absent.
pub fn filter_out(df: &DataFrame, blocklist: &Blocklist, column: &str) -> Result<DataFrame> {
    let series = require_column(df, column)?;
    if blocklist.is_empty() {
        return Ok(df.clone());
    }

    let keep: Vec<bool> = scalars(series)?
        .iter()
        .map(|value| !blocklist.contains(value))
        .collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Stable ascending sort on one column; nulls go last.
///
/// # Errors
///
/// Fails with `ColumnNotFound` if `column` is absent.
pub fn sort_by(df: &DataFrame, column: &str) -> Result<DataFrame> {
    require_column(df, column)?;
    let options = SortMultipleOptions::default()
        .with_maintain_order(true)
        .with_nulls_last(true);
    Ok(df.sort([column], options)?)
}

/// Removes blocklisted rows, then sorts the survivors ascending by `column`.
///
/// # Errors
///
/// Fails with `ColumnNotFound`, listing the available columns, if `column`
/// is absent. No partial frame is returned.
pub fn filter_sort(df: &DataFrame, blocklist: &Blocklist, column: &str) -> Result<Filtered> {
    let rows_before = df.height();
    let kept = filter_out(df, blocklist, column)?;
    let frame = sort_by(&kept, column)?;
    Ok(Filtered {
        rows_after: frame.height(),
        frame,
        rows_before,
    })
}
