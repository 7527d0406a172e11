//! Opening and initializing the application's SQLite database.

use std::{path::Path, time::Duration};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, record::create_record_table};

/// How long a connection waits on a lock held by another connection before
/// giving up with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the tables for the domain models if they do not exist yet.
///
/// Running this against an existing database leaves its rows untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if the schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_record_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Open the database file at `path`, creating it if needed, and initialize it.
///
/// The database uses write-ahead logging so that a committed record survives
/// the process stopping right after the commit.
///
/// # Errors
/// Returns an [Error::SqlError] if the file cannot be opened or initialized.
pub fn open_connection(path: &Path) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;

    let journal_mode: String =
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    connection.pragma_update(None, "synchronous", "FULL")?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    initialize(&connection)?;

    tracing::debug!(%journal_mode, "opened database at {}", path.display());

    Ok(connection)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rusqlite::Connection;

    use crate::record::{RecordForm, create_transaction, list_transactions};

    use super::{initialize, open_connection};

    fn form(amount: &str, category: &str) -> RecordForm {
        RecordForm {
            amount: Some(amount.into()),
            category: Some(category.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn reinitializing_keeps_existing_records() {
        let db = Mutex::new(Connection::open_in_memory().unwrap());
        initialize(&db.lock().unwrap()).unwrap();
        let created = create_transaction(form("8.00", "Coffee"), &db).unwrap();

        initialize(&db.lock().unwrap()).unwrap();

        assert_eq!(list_transactions(&db), Ok(vec![created]));
    }

    #[test]
    fn records_survive_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let created = {
            let db = Mutex::new(open_connection(&path).unwrap());
            vec![
                create_transaction(form("42.50", "餐饮"), &db).unwrap(),
                create_transaction(form("3.20", "Transport"), &db).unwrap(),
            ]
        };

        let db = Mutex::new(open_connection(&path).unwrap());
        assert_eq!(list_transactions(&db), Ok(created));
    }

    #[test]
    fn ids_keep_increasing_after_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let first = {
            let db = Mutex::new(open_connection(&path).unwrap());
            create_transaction(form("1", "First"), &db).unwrap()
        };

        let db = Mutex::new(open_connection(&path).unwrap());
        let second = create_transaction(form("1", "Second"), &db).unwrap();

        assert!(second.id > first.id);
    }
}
