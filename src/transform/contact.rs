//! Contact actions reshaping.
//!
//! Reach puts both phone numbers and email addresses in one "Contact Info
//! Value" column. EA wants them apart, plus a single display name.

use crate::error::Result;
use crate::table::{require_column, require_columns, scalars};
use polars::prelude::*;

pub const ACTION_TYPE: &str = "Action Type";
pub const CONTACT_INFO_VALUE: &str = "Contact Info Value";
pub const USER_FIRST_NAME: &str = "User First Name";
pub const USER_LAST_NAME: &str = "User Last Name";
pub const PHONE: &str = "Phone";
pub const EMAIL: &str = "Email";
pub const COMBINED_NAME: &str = "Combined Name";

/// A contact value is an email address when it contains `@`. Null never is.
pub fn is_email(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.contains('@'))
}

/// Splits "Contact Info Value" into "Phone" and "Email" and adds "Combined Name".
///
/// - Email rows: the value moves to "Email" and the "Phone" cell becomes `""`.
/// - Every other row: the value stays in "Phone" and "Email" is null.
/// - "Contact Info Value" is renamed to "Phone" in place; "Email" and
///   "Combined Name" are appended.
/// - "Combined Name" is first name, one space, last name, with a null part
///   written as the empty string (`"Jo "` when the last name is missing).
///
/// # Errors
///
/// Fails with `ColumnNotFound` if any of the three source columns is absent.
pub fn split_contact_info(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &[CONTACT_INFO_VALUE, USER_FIRST_NAME, USER_LAST_NAME])?;

    // Numeric phone columns come through as text
    let contact = require_column(df, CONTACT_INFO_VALUE)?.cast(&DataType::String)?;
    let contact = contact.str()?;

    let mut phones: Vec<Option<String>> = Vec::with_capacity(df.height());
    let mut emails: Vec<Option<String>> = Vec::with_capacity(df.height());
    for value in contact {
        if is_email(value) {
            emails.push(value.map(str::to_owned));
            phones.push(Some(String::new()));
        } else {
            emails.push(None);
            phones.push(value.map(str::to_owned));
        }
    }

    let mut out = df.clone();
    out.with_column(Series::new(CONTACT_INFO_VALUE.into(), phones))?;
    out.rename(CONTACT_INFO_VALUE, PHONE.into())?;
    out.with_column(Series::new(EMAIL.into(), emails))?;
    out.with_column(Series::new(COMBINED_NAME.into(), combined_names(df)?))?;
    Ok(out)
}

fn combined_names(df: &DataFrame) -> Result<Vec<String>> {
    let first = scalars(require_column(df, USER_FIRST_NAME)?)?;
    let last = scalars(require_column(df, USER_LAST_NAME)?)?;
    Ok(first
        .iter()
        .zip(&last)
        .map(|(first, last)| format!("{first} {last}"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessorError;
    use crate::table::column_names;

    fn cell(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        df.column(column)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(row)
            .map(str::to_owned)
    }

    #[test]
    fn test_email_row() -> Result<()> {
        let df = df!(
            "Action Type" => &["Email"],
            "Contact Info Value" => &["a@b.com"],
            "User First Name" => &["Jo"],
            "User Last Name" => &["Lee"]
        )?;

        let out = split_contact_info(&df)?;
        assert_eq!(cell(&out, EMAIL, 0).as_deref(), Some("a@b.com"));
        assert_eq!(cell(&out, PHONE, 0).as_deref(), Some(""));
        assert_eq!(cell(&out, COMBINED_NAME, 0).as_deref(), Some("Jo Lee"));
        Ok(())
    }

    #[test]
    fn test_phone_row_and_column_layout() -> Result<()> {
        let df = df!(
            "Action Type" => &["Call", "Text"],
            "Contact Info Value" => &[Some("555-0100"), None],
            "User First Name" => &["Sam", "Ari"],
            "User Last Name" => &["Park", "Cole"]
        )?;

        let out = split_contact_info(&df)?;
        assert_eq!(cell(&out, PHONE, 0).as_deref(), Some("555-0100"));
        assert_eq!(cell(&out, EMAIL, 0), None);
        assert_eq!(cell(&out, PHONE, 1), None);
        assert_eq!(cell(&out, EMAIL, 1), None);
        assert_eq!(
            column_names(&out),
            [
                "Action Type",
                "Phone",
                "User First Name",
                "User Last Name",
                "Email",
                "Combined Name"
            ]
            .map(str::to_owned)
            .to_vec()
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_values_classified_per_row() -> Result<()> {
        let df = df!(
            "Contact Info Value" => &["x@y.org", "555-0199", "x@y.org"],
            "User First Name" => &["A", "B", "C"],
            "User Last Name" => &["D", "E", "F"]
        )?;

        let out = split_contact_info(&df)?;
        assert_eq!(cell(&out, EMAIL, 0).as_deref(), Some("x@y.org"));
        assert_eq!(cell(&out, EMAIL, 1), None);
        assert_eq!(cell(&out, EMAIL, 2).as_deref(), Some("x@y.org"));
        Ok(())
    }

    #[test]
    fn test_numeric_contact_values_become_text() -> Result<()> {
        let df = df!(
            "Contact Info Value" => &[5_550_100_i64],
            "User First Name" => &["Jo"],
            "User Last Name" => &["Lee"]
        )?;

        let out = split_contact_info(&df)?;
        assert_eq!(cell(&out, PHONE, 0).as_deref(), Some("5550100"));
        Ok(())
    }

    #[test]
    fn test_null_name_part_is_empty_string() -> Result<()> {
        let df = df!(
            "Contact Info Value" => &["a@b.com", "a@b.com"],
            "User First Name" => &[Some("Jo"), None],
            "User Last Name" => &[None, Some("Lee")]
        )?;

        let out = split_contact_info(&df)?;
        assert_eq!(cell(&out, COMBINED_NAME, 0).as_deref(), Some("Jo "));
        assert_eq!(cell(&out, COMBINED_NAME, 1).as_deref(), Some(" Lee"));
        Ok(())
    }

    #[test]
    fn test_missing_name_column_fails() {
        let df = df!(
            "Contact Info Value" => &["a@b.com"],
            "User First Name" => &["Jo"]
        )
        .unwrap();

        assert!(matches!(
            split_contact_info(&df),
            Err(ProcessorError::ColumnNotFound { column, .. }) if column == USER_LAST_NAME
        ));
    }

    #[test]
    fn test_is_email() {
        assert!(is_email(Some("someone@example.com")));
        assert!(!is_email(Some("555-0100")));
        assert!(!is_email(None));
    }
}
