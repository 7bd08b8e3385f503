//! Notification repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist notification records and their read/archive lifecycle.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `mark_read` and `archive` are idempotent: the first timestamp wins.
//! - Listing is newest-first within one recipient.

use crate::model::notification::{
    Notification, NotificationCategory, NotificationId, NotificationKind, NotificationPriority,
};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTIFICATION_COLUMNS: &[&str] = &[
    "id",
    "recipient",
    "title",
    "body",
    "kind",
    "priority",
    "category",
    "created_at",
    "read_at",
    "archived_at",
    "expires_at",
];

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    recipient,
    title,
    body,
    kind,
    priority,
    category,
    created_at,
    read_at,
    archived_at,
    expires_at
FROM notifications";

/// Query options for listing notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub recipient: String,
    pub unread_only: bool,
    pub include_archived: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for notification records.
pub trait NotificationRepository {
    fn create(&self, notification: &Notification) -> RepoResult<NotificationId>;
    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    fn list(&self, query: &NotificationQuery) -> RepoResult<Vec<Notification>>;
    /// Stamps `read_at` once; later calls keep the first timestamp.
    fn mark_read(&self, id: NotificationId, read_at: i64) -> RepoResult<()>;
    /// Stamps `archived_at` once; later calls keep the first timestamp.
    fn archive(&self, id: NotificationId, archived_at: i64) -> RepoResult<()>;
    fn unread_count(&self, recipient: &str) -> RepoResult<u64>;
    /// Deletes expired notifications; returns how many were removed.
    fn purge_expired(&self, now: i64) -> RepoResult<u64>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "notifications", NOTIFICATION_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create(&self, notification: &Notification) -> RepoResult<NotificationId> {
        notification.validate()?;

        self.conn.execute(
            "INSERT INTO notifications (
                id,
                recipient,
                title,
                body,
                kind,
                priority,
                category,
                created_at,
                read_at,
                archived_at,
                expires_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                notification.id.to_string(),
                notification.recipient.as_str(),
                notification.title.as_str(),
                notification.body.as_str(),
                notification.kind.as_str(),
                notification.priority.as_str(),
                notification.category.as_str(),
                notification.created_at,
                notification.read_at,
                notification.archived_at,
                notification.expires_at,
            ],
        )?;

        Ok(notification.id)
    }

    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_row(row)?));
        }
        Ok(None)
    }

    fn list(&self, query: &NotificationQuery) -> RepoResult<Vec<Notification>> {
        let mut sql = format!("{NOTIFICATION_SELECT_SQL} WHERE recipient = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.recipient.clone())];

        if query.unread_only {
            sql.push_str(" AND read_at IS NULL");
        }
        if !query.include_archived {
            sql.push_str(" AND archived_at IS NULL");
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }

        Ok(notifications)
    }

    fn mark_read(&self, id: NotificationId, read_at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET read_at = COALESCE(read_at, ?1)
             WHERE id = ?2;",
            params![read_at, id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn archive(&self, id: NotificationId, archived_at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET archived_at = COALESCE(archived_at, ?1)
             WHERE id = ?2;",
            params![archived_at, id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn unread_count(&self, recipient: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM notifications
             WHERE recipient = ?1
               AND read_at IS NULL
               AND archived_at IS NULL;",
            [recipient],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn purge_expired(&self, now: i64) -> RepoResult<u64> {
        let removed = self.conn.execute(
            "DELETE FROM notifications
             WHERE expires_at IS NOT NULL AND expires_at <= ?1;",
            [now],
        )?;
        Ok(removed as u64)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "notifications.id")?;

    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in notifications.kind"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = NotificationPriority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in notifications.priority"
        ))
    })?;

    let category_text: String = row.get("category")?;
    let category = NotificationCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in notifications.category"
        ))
    })?;

    let notification = Notification {
        id,
        recipient: row.get("recipient")?,
        title: row.get("title")?,
        body: row.get("body")?,
        kind,
        priority,
        category,
        created_at: row.get("created_at")?,
        read_at: row.get("read_at")?,
        archived_at: row.get("archived_at")?,
        expires_at: row.get("expires_at")?,
    };
    notification.validate()?;

    Ok(notification)
}
