//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for window layouts and
//!   notifications.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce model validation before persistence.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories refuse to operate on unmigrated connections.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::notification::NotificationValidationError;
use crate::model::window::WindowValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod layout_repo;
pub mod notification_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence and query errors shared by desktop repositories.
#[derive(Debug)]
pub enum RepoError {
    WindowValidation(WindowValidationError),
    NotificationValidation(NotificationValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WindowValidation(err) => write!(f, "{err}"),
            Self::NotificationValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: expected schema version {expected_version}, found {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table is missing: {table}")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column is missing: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WindowValidation(err) => Some(err),
            Self::NotificationValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WindowValidationError> for RepoError {
    fn from(value: WindowValidationError) -> Self {
        Self::WindowValidation(value)
    }
}

impl From<NotificationValidationError> for RepoError {
    fn from(value: NotificationValidationError) -> Self {
        Self::NotificationValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies the connection is migrated and carries the required schema.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let mut rows = stmt.query([table])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
