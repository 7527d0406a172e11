//! Defines the endpoints for reading records back out of the ledger.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, ValidationError,
    database_id::RecordId,
    record::{Record, get_transaction, list_transactions},
};

/// The state needed to read records.
#[derive(Debug, Clone)]
pub struct RecordsState {
    /// The database connection for reading records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecordsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing every record in the order they were created.
///
/// An empty ledger is an empty JSON array, not an error.
pub async fn list_records_endpoint(
    State(state): State<RecordsState>,
) -> Result<Json<Vec<Record>>, Error> {
    list_transactions(&state.db_connection).map(Json)
}

/// A route handler for getting a single record by its ID.
pub async fn get_record_endpoint(
    State(state): State<RecordsState>,
    record_id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Record>, Error> {
    let Path(record_id) =
        record_id.map_err(|rejection| ValidationError::InvalidPath(rejection.body_text()))?;

    get_transaction(record_id, &state.db_connection).map(Json)
}
