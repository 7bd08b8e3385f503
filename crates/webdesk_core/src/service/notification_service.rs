//! Notification use-case service.
//!
//! # Responsibility
//! - Create, list and transition notification records.
//!
//! # Invariants
//! - Lifecycle timestamps are taken once, at the service boundary, so a
//!   repository retry cannot move them.

use crate::model::notification::{
    Notification, NotificationCategory, NotificationId, NotificationKind, NotificationPriority,
};
use crate::repo::notification_repo::{NotificationQuery, NotificationRepository};
use crate::repo::RepoResult;
use chrono::Utc;
use log::info;

/// Request model for posting a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    pub recipient: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
    /// Optional expiry in epoch milliseconds.
    pub expires_at: Option<i64>,
}

/// Use-case service wrapper for notification operations.
pub struct NotificationService<R: NotificationRepository> {
    repo: R,
}

impl<R: NotificationRepository> NotificationService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Posts one notification and returns its stable id.
    pub fn notify(&self, request: &NotifyRequest) -> RepoResult<NotificationId> {
        let mut notification = Notification::new(
            &request.recipient,
            &request.title,
            &request.body,
            request.kind,
            request.priority,
            request.category,
            Utc::now().timestamp_millis(),
        );
        notification.expires_at = request.expires_at;
        let id = self.repo.create(&notification)?;
        info!(
            "event=notify module=service status=ok kind={} priority={}",
            request.kind.as_str(),
            request.priority.as_str()
        );
        Ok(id)
    }

    /// Gets one notification by id.
    pub fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        self.repo.get(id)
    }

    /// Lists notifications using filter and pagination options.
    pub fn list(&self, query: &NotificationQuery) -> RepoResult<Vec<Notification>> {
        self.repo.list(query)
    }

    /// Marks one notification read; repeat calls keep the first timestamp.
    pub fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        self.repo.mark_read(id, Utc::now().timestamp_millis())
    }

    /// Archives one notification; repeat calls keep the first timestamp.
    pub fn archive(&self, id: NotificationId) -> RepoResult<()> {
        self.repo.archive(id, Utc::now().timestamp_millis())
    }

    /// Unread, unarchived count for one recipient.
    pub fn unread_count(&self, recipient: &str) -> RepoResult<u64> {
        self.repo.unread_count(recipient)
    }

    /// Deletes notifications whose expiry has passed.
    pub fn purge_expired(&self) -> RepoResult<u64> {
        let removed = self.repo.purge_expired(Utc::now().timestamp_millis())?;
        if removed > 0 {
            info!("event=notification_purge module=service status=ok removed={removed}");
        }
        Ok(removed)
    }
}
