//! Defines the endpoint for creating a new record.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    endpoints::format_endpoint,
    record::{RecordInput, create_transaction},
};

/// The state needed to create a record.
#[derive(Debug, Clone)]
pub struct CreateRecordState {
    /// The database connection for storing records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new record.
///
/// Accepts either a JSON or a URL encoded form body and responds with
/// `201 Created`, the stored record as JSON and a `Location` header pointing
/// at the new record.
pub async fn create_record_endpoint(
    State(state): State<CreateRecordState>,
    RecordInput(form): RecordInput,
) -> Result<Response, Error> {
    let record = create_transaction(form, &state.db_connection)?;

    let location = format_endpoint(endpoints::RECORD, record.id);
    let mut response = (StatusCode::CREATED, Json(record)).into_response();

    match HeaderValue::from_str(&location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(error) => tracing::warn!("could not set location header {location:?}: {error}"),
    }

    Ok(response)
}
