//! SQLite storage bootstrap, schema migrations and atomic write scopes.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the fleet ledger.
//! - Apply schema migrations in deterministic order.
//! - Provide the savepoint scope every mutating store call runs in.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - A failed write scope is rolled back before its error reaches the caller.

use log::error;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

const SAVEPOINT_NAME: &str = "fleet_write";

/// Runs `op` inside a SQLite savepoint.
///
/// The savepoint is released when `op` succeeds and rolled back when it
/// fails, so either every statement issued by `op` is applied or none is.
/// Savepoints nest: a service may open one scope and call store methods
/// that open their own.
///
/// # Errors
/// - Returns the error produced by `op` after rollback.
/// - Returns a SQLite error when the savepoint cannot be opened or released.
pub fn with_savepoint<T, E, F>(conn: &Connection, op: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT_NAME};"))?;

    match op(conn) {
        Ok(value) => {
            if let Err(err) = conn.execute_batch(&format!("RELEASE {SAVEPOINT_NAME};")) {
                rollback_savepoint(conn);
                return Err(err.into());
            }
            Ok(value)
        }
        Err(err) => {
            rollback_savepoint(conn);
            Err(err)
        }
    }
}

fn rollback_savepoint(conn: &Connection) {
    if let Err(err) = conn.execute_batch(&format!(
        "ROLLBACK TO {SAVEPOINT_NAME}; RELEASE {SAVEPOINT_NAME};"
    )) {
        error!(
            "event=savepoint_rollback module=db status=error error_code=rollback_failed error={}",
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{open_db_in_memory, with_savepoint};
    use rusqlite::Connection;

    fn company_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM companies;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn savepoint_commits_on_success() {
        let conn = open_db_in_memory().unwrap();
        with_savepoint(&conn, |conn| {
            conn.execute("INSERT INTO companies (name) VALUES ('Acme');", [])
        })
        .unwrap();
        assert_eq!(company_count(&conn), 1);
    }

    #[test]
    fn savepoint_rolls_back_every_statement_on_error() {
        let conn = open_db_in_memory().unwrap();
        let result: Result<(), rusqlite::Error> = with_savepoint(&conn, |conn| {
            conn.execute("INSERT INTO companies (name) VALUES ('Acme');", [])?;
            conn.execute("INSERT INTO no_such_table (x) VALUES (1);", [])?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(company_count(&conn), 0);
    }

    #[test]
    fn nested_savepoint_failure_rolls_back_outer_scope_too() {
        let conn = open_db_in_memory().unwrap();
        let result: Result<(), rusqlite::Error> = with_savepoint(&conn, |conn| {
            conn.execute("INSERT INTO companies (name) VALUES ('Outer');", [])?;
            with_savepoint(conn, |conn| {
                conn.execute("INSERT INTO companies (name) VALUES ('Inner');", [])
            })?;
            conn.execute("INSERT INTO no_such_table (x) VALUES (1);", [])?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(company_count(&conn), 0);
        assert!(conn.is_autocommit());
    }
}
