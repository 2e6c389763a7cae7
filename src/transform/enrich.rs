//! Pipeline instance filtering and people enrichment.

use super::filter::{filter_out, filter_sort};
use crate::error::{ProcessorError, Result};
use crate::table::{
    Blocklist, KeyScalar, Scalar, column_names, epoch_days, require_column, require_columns,
    scalars,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

pub const STATUS: &str = "Status";
pub const STEP: &str = "Step";
pub const REACH_ID: &str = "Reach ID";
pub const CREATED_TIMESTAMP: &str = "Created Timestamp";
pub const UPDATED_TIMESTAMP: &str = "Updated Timestamp";
pub const RECORDED_TIMESTAMP: &str = "Recorded Timestamp";

/// Timestamp columns truncated to calendar dates after the join.
pub const TIMESTAMP_COLUMNS: [&str; 3] = [CREATED_TIMESTAMP, UPDATED_TIMESTAMP, RECORDED_TIMESTAMP];

/// People columns carried into the join, in output order.
pub const PEOPLE_COLUMNS: [&str; 14] = [
    REACH_ID,
    "First Name",
    "Preferred Name",
    "Middle Name",
    "Last Name",
    "Suffix",
    "Phone Country Code",
    "Phone",
    "Email",
    "Address Line 1",
    "Address Line 2",
    "City",
    "State",
    "Zip",
];

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Whether pipeline rows get joined against a people table.
#[derive(Debug, Clone, Copy)]
pub enum Enrichment<'a> {
    /// Filter and sort only. Timestamp columns are returned as loaded.
    Skip,
    /// Join on "Reach ID" and normalize the timestamps to dates.
    WithPeople(&'a DataFrame),
}

/// Filters pipeline instances by status and step, then optionally enriches them.
///
/// 1. Drop rows whose "Status" is in `status_blocklist`.
/// 2. Drop rows whose "Step" is in `step_blocklist`; stable sort by "Step".
/// 3. With [`Enrichment::WithPeople`], project the people table to
///    [`PEOPLE_COLUMNS`], left join on "Reach ID", and truncate every
///    [`TIMESTAMP_COLUMNS`] value to its calendar date.
///
/// All required columns are checked before any work is done.
///
/// # Errors
///
/// - `ColumnNotFound` if a pipeline or people column is missing
/// - `TimestampParseError` if a timestamp cell cannot be parsed
pub fn enrich_pipeline(
    pipeline: &DataFrame,
    enrichment: Enrichment<'_>,
    status_blocklist: &Blocklist,
    step_blocklist: &Blocklist,
) -> Result<DataFrame> {
    require_columns(pipeline, &[STATUS, STEP])?;
    if let Enrichment::WithPeople(people) = enrichment {
        require_columns(pipeline, &[REACH_ID])?;
        require_columns(pipeline, &TIMESTAMP_COLUMNS)?;
        require_columns(people, &PEOPLE_COLUMNS)?;
    }

    let active = filter_out(pipeline, status_blocklist, STATUS)?;
    let filtered = filter_sort(&active, step_blocklist, STEP)?.frame;

    match enrichment {
        Enrichment::Skip => Ok(filtered),
        Enrichment::WithPeople(people) => {
            let projected = people.select(PEOPLE_COLUMNS)?;
            let mut merged = left_join(&filtered, &projected, REACH_ID)?;
            for column in TIMESTAMP_COLUMNS {
                truncate_to_date(&mut merged, column)?;
            }
            Ok(merged)
        }
    }
}

/// Left outer join on a shared key column.
///
/// Every left row appears once per matching right row, or once with nulls in
/// the right-hand columns when nothing matches. Null keys never match. Key
/// equality is type-sensitive. Non-key columns present on both sides get
/// `_x` (left) and `_y` (right) suffixes. Left row order is preserved.
///
/// # Errors
///
/// - `ColumnNotFound` if `key` is missing from either side
/// - `DataProcessing` if the two key columns have incompatible types, since
///   no row could ever match
pub fn left_join(left: &DataFrame, right: &DataFrame, key: &str) -> Result<DataFrame> {
    let left_key = require_column(left, key)?;
    let right_key = require_column(right, key)?;
    check_key_types(key, left_key.dtype(), right_key.dtype())?;

    let left_keys = scalars(left_key)?;
    let right_keys = scalars(right_key)?;

    let mut right_index: HashMap<KeyScalar, Vec<usize>> = HashMap::new();
    for (row, value) in right_keys.into_iter().enumerate() {
        if let Some(key) = KeyScalar::new(value) {
            right_index.entry(key).or_default().push(row);
        }
    }

    let mut left_rows: Vec<IdxSize> = Vec::with_capacity(left.height());
    let mut right_rows: Vec<Option<usize>> = Vec::with_capacity(left.height());
    for (row, value) in left_keys.into_iter().enumerate() {
        let row = to_idx(row)?;
        match KeyScalar::new(value).and_then(|key| right_index.get(&key)) {
            Some(matches) => {
                for matched in matches {
                    left_rows.push(row);
                    right_rows.push(Some(*matched));
                }
            }
            None => {
                left_rows.push(row);
                right_rows.push(None);
            }
        }
    }

    let mut joined = left.take(&IdxCa::from_vec("rows".into(), left_rows))?;

    let left_names: HashSet<String> = column_names(left).into_iter().collect();
    let right_names = column_names(right);
    for name in &right_names {
        if name != key && left_names.contains(name) {
            joined.rename(name, format!("{name}{LEFT_SUFFIX}").into())?;
        }
    }

    for column in right.get_columns() {
        let series = column.as_materialized_series();
        let name = series.name().as_str();
        if name == key {
            continue;
        }
        let values = right_rows
            .iter()
            .map(|row| match row {
                Some(row) => series.get(*row),
                None => Ok(AnyValue::Null),
            })
            .collect::<PolarsResult<Vec<_>>>()?;
        let out_name = if left_names.contains(name) {
            format!("{name}{RIGHT_SUFFIX}")
        } else {
            name.to_owned()
        };
        let gathered =
            Series::from_any_values_and_dtype(out_name.into(), &values, series.dtype(), false)?;
        joined.with_column(gathered)?;
    }

    Ok(joined)
}

/// Integer widths compare equal as keys; an all-null column matches any type.
fn check_key_types(key: &str, left: &DataType, right: &DataType) -> Result<()> {
    let compatible = left == right
        || (left.is_integer() && right.is_integer())
        || matches!(left, DataType::Null)
        || matches!(right, DataType::Null);
    if compatible {
        Ok(())
    } else {
        Err(ProcessorError::DataProcessing(format!(
            "Cannot join on '{key}': left column is {left}, right column is {right}"
        )))
    }
}

fn to_idx(row: usize) -> Result<IdxSize> {
    IdxSize::try_from(row)
        .map_err(|_| ProcessorError::DataProcessing(format!("Row index {row} out of range")))
}

/// Replaces a column with its values truncated to calendar dates.
///
/// Date columns are left alone, so applying this twice changes nothing.
fn truncate_to_date(df: &mut DataFrame, column: &str) -> Result<()> {
    let series = require_column(df, column)?;
    if series.dtype() == &DataType::Date {
        return Ok(());
    }

    let days = scalars(series)?
        .into_iter()
        .map(|value| Ok(to_date(column, value)?.map(epoch_days)))
        .collect::<Result<Vec<Option<i32>>>>()?;

    let dates = Series::new(column.into(), days).cast(&DataType::Date)?;
    df.with_column(dates)?;
    Ok(())
}

fn to_date(column: &str, value: Scalar) -> Result<Option<NaiveDate>> {
    let parse_error = |value: String| ProcessorError::TimestampParseError {
        column: column.to_owned(),
        value,
    };

    match value {
        Scalar::Null => Ok(None),
        Scalar::Date(date) => Ok(Some(date)),
        Scalar::Datetime(dt) => Ok(Some(dt.date())),
        Scalar::Str(s) if s.trim().is_empty() => Ok(None),
        Scalar::Str(s) => parse_timestamp(&s).map(Some).ok_or_else(|| parse_error(s)),
        other => Err(parse_error(other.to_string())),
    }
}

const OFFSET_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const NAIVE_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a timestamp string and keeps its wall-clock calendar date.
///
/// An offset, when present, is dropped without converting to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }

    let naive = s
        .strip_suffix('Z')
        .or_else(|| s.strip_suffix(" UTC"))
        .unwrap_or(s);
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, fmt) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> DataFrame {
        df!(
            "Reach ID" => &["A1", "B7"],
            "First Name" => &["Jo", "Max"],
            "Preferred Name" => &[None::<&str>, None],
            "Middle Name" => &[None::<&str>, None],
            "Last Name" => &["Lee", "Diaz"],
            "Suffix" => &[None::<&str>, None],
            "Phone Country Code" => &[1, 1],
            "Phone" => &["555-0100", "555-0111"],
            "Email" => &["jo@example.com", "max@example.com"],
            "Address Line 1" => &["1 Main St", "9 Elm St"],
            "Address Line 2" => &[None::<&str>, None],
            "City" => &["Springfield", "Shelbyville"],
            "State" => &["IL", "IL"],
            "Zip" => &["62701", "62565"],
            "Source Tag" => &["Web", "Event"]
        )
        .unwrap()
    }

    fn pipeline() -> DataFrame {
        df!(
            "Reach ID" => &["A1", "A2", "Z9"],
            "Status" => &["active", "canceled", "active"],
            "Step" => &["review", "review", "approved"],
            "Created Timestamp" => &["2024-01-05T10:00:00Z", "2024-01-06T10:00:00Z", "2024-02-01 08:30:00"],
            "Updated Timestamp" => &["2024-01-07T23:59:59-05:00", "2024-01-08", "02/03/2024 09:15"],
            "Recorded Timestamp" => &[None, Some("2024-01-09"), Some("2024-02-04")]
        )
        .unwrap()
    }

    fn str_at(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        match Scalar::from_any_value(&df.column(column).unwrap().get(row).unwrap()) {
            Scalar::Null => None,
            other => Some(other.to_string()),
        }
    }

    #[test]
    fn test_status_filter_and_join() -> Result<()> {
        let people = people();
        let out = enrich_pipeline(
            &pipeline(),
            Enrichment::WithPeople(&people),
            &Blocklist::from_strs(["canceled"]),
            &Blocklist::default(),
        )?;

        assert_eq!(out.height(), 2);
        // Sorted by Step: "approved" before "review"
        assert_eq!(str_at(&out, REACH_ID, 0).as_deref(), Some("Z9"));
        assert_eq!(str_at(&out, REACH_ID, 1).as_deref(), Some("A1"));
        assert_eq!(str_at(&out, "First Name", 1).as_deref(), Some("Jo"));
        assert_eq!(str_at(&out, CREATED_TIMESTAMP, 1).as_deref(), Some("2024-01-05"));
        assert_eq!(out.column(CREATED_TIMESTAMP)?.dtype(), &DataType::Date);
        Ok(())
    }

    #[test]
    fn test_unmatched_row_has_null_people_columns() -> Result<()> {
        let people = people();
        let out = enrich_pipeline(
            &pipeline(),
            Enrichment::WithPeople(&people),
            &Blocklist::default(),
            &Blocklist::default(),
        )?;

        assert_eq!(out.height(), 3);
        assert_eq!(str_at(&out, REACH_ID, 0).as_deref(), Some("Z9"));
        for column in &PEOPLE_COLUMNS[1..] {
            assert_eq!(str_at(&out, column, 0), None, "{column} should be null");
        }
        // "Source Tag" is not part of the projection
        assert!(out.column("Source Tag").is_err());
        Ok(())
    }

    #[test]
    fn test_step_blocklist() -> Result<()> {
        let out = enrich_pipeline(
            &pipeline(),
            Enrichment::Skip,
            &Blocklist::default(),
            &Blocklist::from_strs(["review"]),
        )?;
        assert_eq!(out.height(), 1);
        assert_eq!(str_at(&out, REACH_ID, 0).as_deref(), Some("Z9"));
        Ok(())
    }

    #[test]
    fn test_skip_mode_leaves_timestamps_raw() -> Result<()> {
        let out = enrich_pipeline(
            &pipeline(),
            Enrichment::Skip,
            &Blocklist::from_strs(["canceled"]),
            &Blocklist::default(),
        )?;
        assert_eq!(out.column(CREATED_TIMESTAMP)?.dtype(), &DataType::String);
        assert!(out.column("First Name").is_err());
        Ok(())
    }

    #[test]
    fn test_join_fans_out_duplicate_keys() -> Result<()> {
        let left = df!("Reach ID" => &["A1", "B2"], "Step" => &["x", "y"])?;
        let right = df!("Reach ID" => &["A1", "A1"], "City" => &["Paris", "Lyon"])?;

        let out = left_join(&left, &right, REACH_ID)?;
        assert_eq!(out.height(), 3);
        assert_eq!(str_at(&out, "City", 0).as_deref(), Some("Paris"));
        assert_eq!(str_at(&out, "City", 1).as_deref(), Some("Lyon"));
        assert_eq!(str_at(&out, REACH_ID, 2).as_deref(), Some("B2"));
        assert_eq!(str_at(&out, "City", 2), None);
        Ok(())
    }

    #[test]
    fn test_join_suffixes_overlapping_columns() -> Result<()> {
        let left = df!("Reach ID" => &[1_i64], "Email" => &["old@example.com"])?;
        let right = df!("Reach ID" => &[1_i64], "Email" => &["new@example.com"])?;

        let out = left_join(&left, &right, REACH_ID)?;
        assert_eq!(
            column_names(&out),
            vec!["Reach ID".to_owned(), "Email_x".to_owned(), "Email_y".to_owned()]
        );
        assert_eq!(str_at(&out, "Email_y", 0).as_deref(), Some("new@example.com"));
        Ok(())
    }

    #[test]
    fn test_join_rejects_mismatched_key_types() {
        let left = df!("Reach ID" => &[1_i64, 2], "Step" => &["x", "y"]).unwrap();
        let right = df!("Reach ID" => &["1", "2"], "City" => &["Paris", "Lyon"]).unwrap();

        match left_join(&left, &right, REACH_ID) {
            Err(ProcessorError::DataProcessing(msg)) => {
                assert!(msg.contains("'Reach ID'"), "{msg}");
            }
            other => panic!("expected DataProcessing, got {other:?}"),
        }
    }

    #[test]
    fn test_join_accepts_mixed_integer_widths() -> Result<()> {
        let left = df!("Reach ID" => &[7_i32], "Step" => &["x"])?;
        let right = df!("Reach ID" => &[7_i64], "City" => &["Paris"])?;

        let out = left_join(&left, &right, REACH_ID)?;
        assert_eq!(str_at(&out, "City", 0).as_deref(), Some("Paris"));
        Ok(())
    }

    #[test]
    fn test_null_keys_never_match() -> Result<()> {
        let left = df!("Reach ID" => &[None::<&str>], "Step" => &["x"])?;
        let right = df!("Reach ID" => &[None::<&str>], "City" => &["Paris"])?;

        let out = left_join(&left, &right, REACH_ID)?;
        assert_eq!(out.height(), 1);
        assert_eq!(str_at(&out, "City", 0), None);
        Ok(())
    }

    #[test]
    fn test_missing_people_column_fails_before_work() {
        let people = people().drop("Zip").unwrap();
        let result = enrich_pipeline(
            &pipeline(),
            Enrichment::WithPeople(&people),
            &Blocklist::default(),
            &Blocklist::default(),
        );
        assert!(matches!(
            result,
            Err(ProcessorError::ColumnNotFound { column, .. }) if column == "Zip"
        ));
    }

    #[test]
    fn test_bad_timestamp_names_column() {
        let people = people();
        let mut pipeline = pipeline();
        pipeline
            .with_column(Series::new(
                UPDATED_TIMESTAMP.into(),
                &["not a date", "2024-01-08", "2024-02-03"],
            ))
            .unwrap();

        let result = enrich_pipeline(
            &pipeline,
            Enrichment::WithPeople(&people),
            &Blocklist::default(),
            &Blocklist::default(),
        );
        assert!(matches!(
            result,
            Err(ProcessorError::TimestampParseError { column, value })
                if column == UPDATED_TIMESTAMP && value == "not a date"
        ));
    }

    #[test]
    fn test_truncate_to_date_is_idempotent() -> Result<()> {
        let mut df = df!("Created Timestamp" => &["2024-01-05T10:00:00Z", "2024-03-01"])?;
        truncate_to_date(&mut df, CREATED_TIMESTAMP)?;
        let once = df.clone();
        truncate_to_date(&mut df, CREATED_TIMESTAMP)?;
        assert!(once.equals_missing(&df));
        assert_eq!(str_at(&df, CREATED_TIMESTAMP, 1).as_deref(), Some("2024-03-01"));
        Ok(())
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_timestamp("2024-01-05T10:00:00Z"), jan5);
        assert_eq!(parse_timestamp("2024-01-05T23:30:00-08:00"), jan5);
        assert_eq!(parse_timestamp("2024-01-05 10:00:00.123"), jan5);
        assert_eq!(parse_timestamp("2024-01-05 10:00:00+0000"), jan5);
        assert_eq!(parse_timestamp("2024-01-05T10:00:00+0000"), jan5);
        assert_eq!(parse_timestamp("2024-01-05T10:00:00.000+0000"), jan5);
        assert_eq!(parse_timestamp("2024-01-05T23:00:00.5-0800"), jan5);
        assert_eq!(parse_timestamp("2024-01-05 10:00:00 UTC"), jan5);
        assert_eq!(parse_timestamp("01/05/2024 4:15 PM"), jan5);
        assert_eq!(parse_timestamp("2024-01-05"), jan5);
        assert_eq!(parse_timestamp("tomorrow"), None);
    }
}
