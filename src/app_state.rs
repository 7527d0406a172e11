//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, timezone::get_local_offset};

/// The state of the REST server.
///
/// Route handlers do not take the whole state, they pull out the parts they
/// need through their own state structs that implement
/// [FromRef](axum::extract::FromRef) for [AppState].
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Shanghai".
    pub local_timezone: String,

    /// The database connection, shared by every request and locked for one
    /// store interaction at a time.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the record table
    /// if it does not exist yet. `local_timezone` should be a valid, canonical
    /// timezone name, e.g. "Asia/Shanghai".
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezoneError] if `local_timezone` is not a
    /// known timezone, or an [Error::SqlError] if the database cannot be
    /// initialized.
    pub fn new(db_connection: Connection, local_timezone: &str) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{AppState, Error};

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "Etc/UTC").unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: u32 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'record'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 1);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let result = AppState::new(Connection::open_in_memory().unwrap(), "Mars/Olympus_Mons");

        assert!(matches!(
            result,
            Err(Error::InvalidTimezoneError(timezone)) if timezone == "Mars/Olympus_Mons"
        ));
    }
}
