//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a ledger record.
///
/// IDs are assigned by SQLite's `AUTOINCREMENT` and are never reused.
pub type RecordId = DatabaseId;
