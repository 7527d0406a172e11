//! Defines the ledger record model and the database queries that persist it.

use rusqlite::{Connection, Row, TransactionBehavior, types::Type};
use serde::Serialize;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{
    Error,
    database_id::RecordId,
    record::{Amount, Category, RecordType},
};

// ============================================================================
// MODELS
// ============================================================================

/// A single expense or income in the ledger.
///
/// Records are immutable once stored. To create a new `Record`, use
/// [Record::build] and pass the builder to [create_record].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// The ID of the record, assigned by the database.
    pub id: RecordId,
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// The label used to group the record, e.g. "餐饮".
    pub category: Category,
    /// Free text describing the record. Empty when no note was given.
    pub note: String,
    /// Whether the money was spent or earned.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// When the record was stored, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Record {
    /// Create a new record.
    ///
    /// Shortcut for [NewRecord] for discoverability.
    pub fn build(amount: Amount, category: Category) -> NewRecord {
        NewRecord {
            amount,
            category,
            note: String::new(),
            record_type: RecordType::default(),
        }
    }
}

/// The validated fields of a record that has not been stored yet.
///
/// The ID and creation time are assigned by [create_record].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// The label used to group the record.
    pub category: Category,
    /// Free text describing the record.
    pub note: String,
    /// Whether the money was spent or earned, defaults to an expense.
    pub record_type: RecordType,
}

impl NewRecord {
    /// Set the note for the record.
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }

    /// Set the type of the record.
    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Timestamps are stored in UTC with a fixed number of sub-second digits so
/// that text order matches time order.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z");

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, rusqlite::Error> {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
}

fn parse_timestamp(text: &str, column: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
        })
}

/// Store a new record in the database.
///
/// The record is written inside a single database transaction, so it is
/// either stored with every field or not at all. The creation time is the
/// current time, clamped so that it is never earlier than the latest stored
/// record. This keeps `created_at` order and insertion order the same even if
/// the system clock goes backwards.
///
/// # Errors
/// This function will return a [Error::SqlError] if the record could not be
/// written, in which case nothing is stored.
pub fn create_record(new_record: NewRecord, connection: &Connection) -> Result<Record, Error> {
    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let latest: Option<String> =
        transaction.query_row("SELECT MAX(created_at) FROM record", [], |row| row.get(0))?;

    let now = OffsetDateTime::now_utc();
    let created_at = match latest {
        Some(latest) => now.max(parse_timestamp(&latest, 0)?),
        None => now,
    };

    let record = transaction
        .prepare(
            "INSERT INTO record (amount, category, note, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, category, note, type, created_at",
        )?
        .query_row(
            (
                new_record.amount,
                new_record.category.as_ref(),
                &new_record.note,
                new_record.record_type,
                format_timestamp(created_at)?,
            ),
            map_record_row,
        )?;

    transaction.commit()?;

    Ok(record)
}

/// Retrieve a record from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored record,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_record(id: RecordId, connection: &Connection) -> Result<Record, Error> {
    let record = connection
        .prepare(
            "SELECT id, amount, category, note, type, created_at FROM record WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_record_row)?;

    Ok(record)
}

/// Retrieve every record in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_records(connection: &Connection) -> Result<Vec<Record>, Error> {
    connection
        .prepare(
            "SELECT id, amount, category, note, type, created_at FROM record
             ORDER BY created_at ASC, id ASC",
        )?
        .query_map([], map_record_row)?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Retrieve the records created at or after `start` and before `end`, in
/// the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_records_created_between(
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<Record>, Error> {
    connection
        .prepare(
            "SELECT id, amount, category, note, type, created_at FROM record
             WHERE created_at >= ?1 AND created_at < ?2
             ORDER BY created_at ASC, id ASC",
        )?
        .query_map(
            (format_timestamp(start)?, format_timestamp(end)?),
            map_record_row,
        )?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Get the total number of records in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
#[cfg(test)]
pub fn count_records(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM record;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the record table in the database.
///
/// `AUTOINCREMENT` guarantees IDs are never reused, even for deleted rows.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount TEXT NOT NULL,
                category TEXT NOT NULL CHECK (length(trim(category)) > 0),
                note TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Used for ordering and for period summaries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_record_created_at ON record(created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Record.
pub fn map_record_row(row: &Row) -> Result<Record, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let category: String = row.get(2)?;
    let note = row.get(3)?;
    let record_type = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(Record {
        id,
        amount,
        category: Category::new_unchecked(&category),
        note,
        record_type,
        created_at: parse_timestamp(&created_at, 5)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
