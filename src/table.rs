//! Table-level building blocks shared by every pipeline stage.
//!
//! A table is a polars [`DataFrame`]. Cell comparisons go through [`Scalar`],
//! which keeps the value's type so that blocklist membership and join keys
//! are exact: `Int(1)`, `Float(1.0)` and `Str("1")` are three different values.

use crate::error::{ProcessorError, Result};
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Days between 0001-01-01 (chrono's CE day 1) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    #[serde(skip)]
    Date(NaiveDate),
    #[serde(skip)]
    Datetime(NaiveDateTime),
}

impl Scalar {
    /// Converts a polars cell into a [`Scalar`].
    ///
    /// Integer widths collapse into `Int` and float widths into `Float`;
    /// types without a dedicated variant fall back to their string rendering.
    pub fn from_any_value(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Null,
            AnyValue::Boolean(b) => Self::Bool(*b),
            AnyValue::Int32(v) => Self::Int(i64::from(*v)),
            AnyValue::Int64(v) => Self::Int(*v),
            AnyValue::UInt32(v) => Self::Int(i64::from(*v)),
            AnyValue::UInt64(v) => match i64::try_from(*v) {
                Ok(v) => Self::Int(v),
                Err(_) => Self::Str(v.to_string()),
            },
            AnyValue::Float32(v) => Self::Float(f64::from(*v)),
            AnyValue::Float64(v) => Self::Float(*v),
            AnyValue::String(s) => Self::Str((*s).to_owned()),
            AnyValue::StringOwned(s) => Self::Str(s.to_string()),
            AnyValue::Date(days) => date_from_epoch_days(*days).map_or(Self::Null, Self::Date),
            AnyValue::Datetime(v, unit, _) => {
                datetime_from_epoch(*v, *unit).map_or(Self::Null, Self::Datetime)
            }
            other => Self::Str(other.str_value().into_owned()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Hashable wrapper used for join keys. Null and NaN keys are never built.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyScalar(Scalar);

impl KeyScalar {
    pub(crate) fn new(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Null => None,
            Scalar::Float(v) if v.is_nan() => None,
            other => Some(Self(other)),
        }
    }
}

impl Eq for KeyScalar {}

impl Hash for KeyScalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(v) => v.hash(state),
            // -0.0 == 0.0, so both must hash alike
            Scalar::Float(v) => {
                if *v == 0.0 {
                    0_u64.hash(state);
                } else {
                    v.to_bits().hash(state);
                }
            }
            Scalar::Str(s) => s.hash(state),
            Scalar::Date(d) => d.hash(state),
            Scalar::Datetime(dt) => dt.hash(state),
        }
    }
}

/// Values to drop from a column during filtering.
///
/// Membership is exact value equality: case-sensitive and type-sensitive.
/// A null cell is only removed when [`Scalar::Null`] is listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blocklist(Vec<Scalar>);

impl Blocklist {
    pub fn new(values: Vec<Scalar>) -> Self {
        Self(values)
    }

    /// Blocklist of string values, the common case for Reach exports.
    pub fn from_strs<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(|v| Scalar::Str(v.into())).collect())
    }

    pub fn contains(&self, value: &Scalar) -> bool {
        self.0.iter().any(|blocked| blocked == value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Scalar> for Blocklist {
    fn from_iter<T: IntoIterator<Item = Scalar>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Column names of a frame, in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.as_str().to_owned())
        .collect()
}

/// Looks up a column, failing with [`ProcessorError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    match df.column(name) {
        Ok(column) => Ok(column.as_materialized_series()),
        Err(_) => Err(ProcessorError::column_not_found(
            name,
            df.get_column_names().into_iter().map(|n| n.as_str()),
        )),
    }
}

/// Checks that every name in `required` is present, reporting the first missing one.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for name in required {
        require_column(df, name)?;
    }
    Ok(())
}

/// Reads every cell of a column as [`Scalar`]s.
pub fn scalars(series: &Series) -> Result<Vec<Scalar>> {
    (0..series.len())
        .map(|idx| Ok(Scalar::from_any_value(&series.get(idx)?)))
        .collect()
}

pub(crate) fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn datetime_from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    utc.map(|dt| dt.naive_utc())
}
