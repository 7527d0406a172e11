//! The ledger's request/response operations.
//!
//! These functions validate caller input, take the database lock for exactly
//! one store interaction, and release it before returning. Route handlers and
//! other front ends call into the ledger through here rather than using the
//! record queries directly.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error,
    database_id::RecordId,
    record::{
        LedgerSummary, Period, Record, RecordForm, create_record, get_all_records, get_record,
        get_records_created_between, summarize,
    },
};

fn lock(db_connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// Validate `form`, apply defaults and store it as a new record.
///
/// Invalid input is rejected before the database lock is taken.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if a field of `form` is invalid,
/// - [Error::DatabaseLockError] if the database lock is poisoned,
/// - or [Error::SqlError] if the record could not be stored.
pub fn create_transaction(
    form: RecordForm,
    db_connection: &Mutex<Connection>,
) -> Result<Record, Error> {
    let new_record = form.validate()?;

    let connection = lock(db_connection)?;
    let record = create_record(new_record, &connection)
        .inspect_err(|error| tracing::error!("could not create record: {error}"))?;

    tracing::debug!(id = record.id, "created record");

    Ok(record)
}

/// Get every record in the ledger in the order they were created.
///
/// # Errors
/// This function will return a [Error::DatabaseLockError] or
/// [Error::SqlError] if the records could not be read. An empty ledger is
/// not an error.
pub fn list_transactions(db_connection: &Mutex<Connection>) -> Result<Vec<Record>, Error> {
    let connection = lock(db_connection)?;

    get_all_records(&connection)
        .inspect_err(|error| tracing::error!("could not list records: {error}"))
}

/// Get a single record by its ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no record with `id`,
/// - or [Error::DatabaseLockError] or [Error::SqlError] if the record could not be read.
pub fn get_transaction(id: RecordId, db_connection: &Mutex<Connection>) -> Result<Record, Error> {
    let connection = lock(db_connection)?;

    get_record(id, &connection)
}

/// Total the records created during `period`, where days are measured in
/// `canonical_timezone`, e.g. "Asia/Shanghai".
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTimezoneError] if `canonical_timezone` is not a known timezone,
/// - [Error::DatabaseLockError] or [Error::SqlError] if the records could not be read,
/// - or [Error::TotalOverflow] if a total is too large to represent.
pub fn summarize_period(
    period: Period,
    canonical_timezone: &str,
    db_connection: &Mutex<Connection>,
) -> Result<LedgerSummary, Error> {
    let (start, end) = period.utc_bounds(canonical_timezone)?;

    let records = {
        let connection = lock(db_connection)?;
        get_records_created_between(start, end, &connection)
            .inspect_err(|error| tracing::error!("could not get records for summary: {error}"))?
    };

    summarize(period, &records)
}
