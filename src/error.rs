//! Defines the app level error types and their conversion into JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

/// Caller supplied data that violates a field constraint.
///
/// Validation errors are raised before the database is touched, so a request
/// that fails validation never leaves anything behind in the ledger.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// The amount was not supplied.
    #[error("amount is required")]
    MissingAmount,

    /// The amount could not be parsed as a decimal number.
    #[error("amount \"{0}\" is not a valid number")]
    InvalidAmount(String),

    /// The amount was less than zero.
    ///
    /// Money leaving the ledger is recorded with the expense type, not with a
    /// negative amount.
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    /// The amount is larger than a single record may hold.
    #[error("amount must be at most {max}, got {amount}")]
    AmountTooLarge {
        /// The rejected amount.
        amount: Decimal,
        /// The largest amount allowed.
        max: Decimal,
    },

    /// The amount has non-zero digits past the second decimal place.
    #[error("amount \"{0}\" has more than two decimal places")]
    TooManyDecimalPlaces(String),

    /// The category was empty or only contained whitespace.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// The category is longer than the database allows.
    #[error("category must be at most {max} characters, got {length}")]
    CategoryTooLong {
        /// The number of characters in the rejected category.
        length: usize,
        /// The maximum number of characters allowed.
        max: usize,
    },

    /// The record type was not one of the recognised values.
    #[error("unrecognised record type \"{0}\", expected \"expense\" or \"income\"")]
    InvalidRecordType(String),

    /// A date range where the start comes after the end.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        /// The first day of the range.
        start: Date,
        /// The last day of the range.
        end: Date,
    },

    /// A day outside the range of dates a summary supports.
    #[error("{field} date {date} must be between 1000-01-01 and 9998-12-31")]
    DateOutOfRange {
        /// The query parameter holding the date.
        field: &'static str,
        /// The rejected day.
        date: Date,
    },

    /// The query string could not be parsed.
    #[error("could not parse the query string: {0}")]
    InvalidQuery(String),

    /// A path parameter, such as the record ID, could not be parsed.
    #[error("could not parse the record ID: {0}")]
    InvalidPath(String),

    /// The request body could not be parsed at all.
    #[error("could not parse the request body: {0}")]
    InvalidBody(String),
}

impl ValidationError {
    /// The name of the request field that caused the error.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingAmount
            | ValidationError::InvalidAmount(_)
            | ValidationError::NegativeAmount(_)
            | ValidationError::AmountTooLarge { .. }
            | ValidationError::TooManyDecimalPlaces(_) => "amount",
            ValidationError::EmptyCategory | ValidationError::CategoryTooLong { .. } => "category",
            ValidationError::InvalidRecordType(_) => "type",
            ValidationError::InvalidDateRange { .. } => "start",
            ValidationError::DateOutOfRange { field, .. } => field,
            ValidationError::InvalidPath(_) => "record_id",
            ValidationError::InvalidQuery(_) => "query",
            ValidationError::InvalidBody(_) => "body",
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent data that does not satisfy the ledger's constraints.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A summary total is too large to be represented.
    #[error("the totals for the period are too large to compute")]
    TotalOverflow,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl Error {
    /// Whether the error means the database could not complete a read or write.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::SqlError(_) | Error::DatabaseLockError)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

/// Build a JSON error response with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str, field: Option<&str>) -> Response {
    let body = ErrorBody {
        success: false,
        message,
        code: status.as_u16(),
        field,
    };

    (status, Json(body)).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(error) => {
                tracing::warn!("rejected invalid {}: {error}", error.field());
                error_response(
                    StatusCode::BAD_REQUEST,
                    &error.to_string(),
                    Some(error.field()),
                )
            }
            Error::NotFound => error_response(
                StatusCode::NOT_FOUND,
                "The requested record could not be found.",
                None,
            ),
            Error::TotalOverflow => {
                tracing::warn!("summary totals overflowed");
                error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "The totals for the period are too large to compute, try a shorter period.",
                    None,
                )
            }
            Error::InvalidTimezoneError(timezone) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
                None,
            ),
            // Database details are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details.",
                    None,
                )
            }
        }
    }
}
