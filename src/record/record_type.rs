//! Whether a record is money spent or money earned.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

use crate::ValidationError;

/// The kind of a ledger record, which decides its sign in a balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Money spent. This is the default when no type is given.
    #[default]
    Expense,
    /// Money earned.
    Income,
}

impl RecordType {
    /// The canonical name used in the database and in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Expense => "expense",
            RecordType::Income => "income",
        }
    }

    /// Parse an optional type, falling back to [RecordType::Expense] when it
    /// is absent or blank.
    ///
    /// # Errors
    ///
    /// This function will return a [ValidationError::InvalidRecordType] if the
    /// type is present but not recognised.
    pub fn parse_or_default(text: Option<&str>) -> Result<Self, ValidationError> {
        match text.map(str::trim) {
            None | Some("") => Ok(RecordType::default()),
            Some(text) => text.parse(),
        }
    }
}

impl FromStr for RecordType {
    type Err = ValidationError;

    /// Parse a record type.
    ///
    /// The English names are case insensitive. The labels "支出" (expense) and
    /// "收入" (income) sent by the mobile client are also accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();

        if text.eq_ignore_ascii_case("expense") || text == "支出" {
            Ok(RecordType::Expense)
        } else if text.eq_ignore_ascii_case("income") || text == "收入" {
            Ok(RecordType::Income)
        } else {
            Err(ValidationError::InvalidRecordType(text.to_owned()))
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for RecordType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
