//! Currency-safe monetary amounts.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ValidationError;

/// A non-negative amount of money with exactly two decimal places.
///
/// Amounts are backed by a [Decimal] so that repeated additions never drift
/// the way binary floating point does. They are stored as text in the
/// database and serialized as a JSON string, e.g. `"42.50"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The number of decimal places every amount is stored with.
    pub const DECIMAL_PLACES: u32 = 2;

    /// The largest amount a single record may hold, 999,999,999,999.99.
    // `Decimal::new` is not const; these parts encode 99_999_999_999_999 at scale 2.
    pub const MAX: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, Self::DECIMAL_PLACES);

    /// Create an amount from a decimal value.
    ///
    /// Trailing zeros past the second decimal place are allowed, so `1.500`
    /// is accepted as `1.50`.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [ValidationError::NegativeAmount] if `value` is less than zero,
    /// - [ValidationError::AmountTooLarge] if `value` is more than [Amount::MAX],
    /// - or [ValidationError::TooManyDecimalPlaces] if `value` cannot be
    ///   represented exactly with two decimal places.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::NegativeAmount(value));
        }

        if value > Self::MAX {
            return Err(ValidationError::AmountTooLarge {
                amount: value,
                max: Self::MAX,
            });
        }

        let mut normalized = value.normalize();

        if normalized.scale() > Self::DECIMAL_PLACES {
            return Err(ValidationError::TooManyDecimalPlaces(value.to_string()));
        }

        // Normalizing "-0" leaves the sign bit set.
        normalized.set_sign_positive(true);
        normalized.rescale(Self::DECIMAL_PLACES);

        Ok(Self(normalized))
    }

    /// Parse an amount from text such as `"42.50"`.
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [ValidationError::MissingAmount] if `text` is blank,
    /// - [ValidationError::InvalidAmount] if `text` is not a decimal number,
    /// - or any error returned by [Amount::new].
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();

        if text.is_empty() {
            return Err(ValidationError::MissingAmount);
        }

        let value = Decimal::from_str(text)
            .map_err(|_| ValidationError::InvalidAmount(text.to_owned()))?;

        Self::new(value)
    }

    /// Create an amount without validation, for totals no single record
    /// can reach.
    #[cfg(test)]
    pub(crate) fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The amount as a decimal with two decimal places.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        let decimal = Decimal::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))?;

        Amount::new(decimal).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
