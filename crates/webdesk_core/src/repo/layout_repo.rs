//! Window layout repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist and restore the full desktop layout keyed by stable window id.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `replace_layout` is atomic: a failed save leaves the stored layout
//!   untouched.
//! - Loaded windows come back ordered by `z_order` ascending.

use crate::model::window::{
    Geometry, Position, Size, SnapState, WindowId, WindowRecord,
};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const LAYOUT_COLUMNS: &[&str] = &[
    "window_id",
    "title",
    "module_id",
    "content_ref",
    "pos_x",
    "pos_y",
    "width",
    "height",
    "z_order",
    "is_minimized",
    "is_maximized",
    "snap_state",
    "prev_x",
    "prev_y",
    "prev_width",
    "prev_height",
    "saved_at",
];

const LAYOUT_SELECT_SQL: &str = "SELECT
    window_id,
    title,
    module_id,
    content_ref,
    pos_x,
    pos_y,
    width,
    height,
    z_order,
    is_minimized,
    is_maximized,
    snap_state,
    prev_x,
    prev_y,
    prev_width,
    prev_height
FROM window_layouts";

/// Repository interface for persisted window layouts.
pub trait LayoutRepository {
    /// Replaces the stored layout with the given windows, atomically.
    fn replace_layout(&self, windows: &[WindowRecord], saved_at: i64) -> RepoResult<()>;
    /// Loads the stored layout, z-order ascending.
    fn load_layout(&self) -> RepoResult<Vec<WindowRecord>>;
    /// Loads one stored window by id.
    fn get_window(&self, id: WindowId) -> RepoResult<Option<WindowRecord>>;
    /// Removes every stored window.
    fn clear_layout(&self) -> RepoResult<()>;
}

/// SQLite-backed layout repository.
pub struct SqliteLayoutRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLayoutRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "window_layouts", LAYOUT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl LayoutRepository for SqliteLayoutRepository<'_> {
    fn replace_layout(&self, windows: &[WindowRecord], saved_at: i64) -> RepoResult<()> {
        for window in windows {
            window.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM window_layouts;", [])?;
        for window in windows {
            tx.execute(
                "INSERT INTO window_layouts (
                    window_id,
                    title,
                    module_id,
                    content_ref,
                    pos_x,
                    pos_y,
                    width,
                    height,
                    z_order,
                    is_minimized,
                    is_maximized,
                    snap_state,
                    prev_x,
                    prev_y,
                    prev_width,
                    prev_height,
                    saved_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
                params![
                    window.id.to_string(),
                    window.title.as_str(),
                    window.module_id.as_str(),
                    window.content_ref.as_str(),
                    window.position.x,
                    window.position.y,
                    window.size.width,
                    window.size.height,
                    window.z_order,
                    i64::from(window.minimized),
                    i64::from(window.maximized),
                    window.snap.as_str(),
                    window.prev_geometry.map(|g| g.position.x),
                    window.prev_geometry.map(|g| g.position.y),
                    window.prev_geometry.map(|g| g.size.width),
                    window.prev_geometry.map(|g| g.size.height),
                    saved_at,
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    fn load_layout(&self) -> RepoResult<Vec<WindowRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LAYOUT_SELECT_SQL} ORDER BY z_order ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut windows = Vec::new();
        while let Some(row) = rows.next()? {
            windows.push(parse_layout_row(row)?);
        }
        Ok(windows)
    }

    fn get_window(&self, id: WindowId) -> RepoResult<Option<WindowRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LAYOUT_SELECT_SQL} WHERE window_id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_layout_row(row)?));
        }
        Ok(None)
    }

    fn clear_layout(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM window_layouts;", [])?;
        Ok(())
    }
}

fn parse_layout_row(row: &Row<'_>) -> RepoResult<WindowRecord> {
    let id_text: String = row.get("window_id")?;
    let id = parse_uuid(&id_text, "window_layouts.window_id")?;

    let snap_text: String = row.get("snap_state")?;
    let snap = SnapState::parse(&snap_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid snap state `{snap_text}` in window_layouts.snap_state"
        ))
    })?;

    let prev_geometry = match (
        row.get::<_, Option<i32>>("prev_x")?,
        row.get::<_, Option<i32>>("prev_y")?,
        row.get::<_, Option<u32>>("prev_width")?,
        row.get::<_, Option<u32>>("prev_height")?,
    ) {
        (Some(x), Some(y), Some(width), Some(height)) => Some(Geometry {
            position: Position::new(x, y),
            size: Size::new(width, height),
        }),
        (None, None, None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(format!(
                "partial previous geometry in window_layouts for `{id_text}`"
            )))
        }
    };

    let record = WindowRecord {
        id,
        title: row.get("title")?,
        module_id: row.get("module_id")?,
        content_ref: row.get("content_ref")?,
        position: Position::new(row.get("pos_x")?, row.get("pos_y")?),
        size: Size::new(row.get("width")?, row.get("height")?),
        z_order: row.get("z_order")?,
        minimized: row.get::<_, i64>("is_minimized")? != 0,
        maximized: row.get::<_, i64>("is_maximized")? != 0,
        snap,
        prev_geometry,
    };
    record.validate()?;

    Ok(record)
}
