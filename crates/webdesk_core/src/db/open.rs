//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas and apply pending migrations before
//!   returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");
    let opened = Connection::open(path);
    finish_open(opened, "file", started_at)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");
    finish_open(Connection::open_in_memory(), "memory", started_at)
}

fn finish_open(
    opened: rusqlite::Result<Connection>,
    mode: &str,
    started_at: Instant,
) -> DbResult<Connection> {
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }
    };

    if let Err(err) = bootstrap_connection(&mut conn) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
