//! The raw, unvalidated input for creating a record.

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of failing like axum::Form.
use axum_extra::extract::Form;
use serde::{Deserialize, Serialize};

use crate::{
    Error, ValidationError,
    record::{Amount, Category, NewRecord, Record, RecordType},
};

/// An amount as sent by the client, either as text or as a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number, e.g. `42.5`.
    Number(serde_json::Number),
    /// Text, e.g. `"42.50"`. Form fields always arrive as text.
    Text(String),
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_owned())
    }
}

/// The fields a client sends to create a record.
///
/// Every field is optional at this stage so that a missing field is reported
/// as a [ValidationError] naming that field rather than a generic parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordForm {
    /// The amount of money, must be non-negative with at most two decimal places.
    #[serde(default)]
    pub amount: Option<AmountInput>,
    /// The category label, must not be blank.
    #[serde(default)]
    pub category: Option<String>,
    /// "expense" or "income", defaults to "expense".
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    /// An optional note, defaults to an empty string.
    #[serde(default)]
    pub note: Option<String>,
}

impl RecordForm {
    /// Check the form against the ledger's field constraints and apply defaults.
    ///
    /// Fields are checked in the order amount, category, type and the first
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the [ValidationError] for the first invalid field.
    pub fn validate(self) -> Result<NewRecord, ValidationError> {
        let amount = match self.amount {
            None => return Err(ValidationError::MissingAmount),
            Some(AmountInput::Text(text)) => Amount::parse(&text)?,
            Some(AmountInput::Number(number)) => Amount::parse(&number.to_string())?,
        };
        let category = Category::new(self.category.as_deref().unwrap_or_default())?;
        let record_type = RecordType::parse_or_default(self.record_type.as_deref())?;

        Ok(Record::build(amount, category)
            .record_type(record_type)
            .note(&self.note.unwrap_or_default()))
    }
}

/// Extracts a [RecordForm] from either a JSON or a URL encoded form body.
///
/// The body is read as JSON when the content type is `application/json`, and
/// as a form otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInput(pub RecordForm);

impl<S> FromRequest<S> for RecordInput
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        let form = if is_json {
            let Json(form) = Json::<RecordForm>::from_request(request, state)
                .await
                .map_err(|rejection| ValidationError::InvalidBody(rejection.body_text()))?;
            form
        } else {
            let Form(form) = Form::<RecordForm>::from_request(request, state)
                .await
                .map_err(|rejection| ValidationError::InvalidBody(rejection.to_string()))?;
            form
        };

        Ok(Self(form))
    }
}
