//! Notification domain model.
//!
//! # Responsibility
//! - Define the canonical record for platform notifications.
//! - Provide lifecycle helpers for read/archive/expiry transitions.
//!
//! # Invariants
//! - `id` is stable and never reused for another notification.
//! - `read_at`/`archived_at` move from `None` to `Some` exactly once; the
//!   transitions are idempotent and never reversed.
//! - All timestamps are unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one notification.
pub type NotificationId = Uuid;

/// Visual/semantic class of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Delivery priority, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Originating subsystem of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    System,
    Security,
    Workflow,
    Message,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Security => "security",
            Self::Workflow => "workflow",
            Self::Message => "message",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Self::System),
            "security" => Some(Self::Security),
            "workflow" => Some(Self::Workflow),
            "message" => Some(Self::Message),
            _ => None,
        }
    }
}

/// Canonical notification record on the platform data boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable global ID used for read/archive addressing.
    pub id: NotificationId,
    /// Recipient user id as issued by the identity backend.
    pub recipient: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Set when the recipient first opened the notification.
    pub read_at: Option<i64>,
    /// Set when the recipient archived the notification.
    pub archived_at: Option<i64>,
    /// Optional expiry; expired rows are eligible for purge.
    pub expires_at: Option<i64>,
}

impl Notification {
    /// Creates a new unread, unarchived notification with a generated ID.
    pub fn new(
        recipient: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        kind: NotificationKind,
        priority: NotificationPriority,
        category: NotificationCategory,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.into(),
            title: title.into(),
            body: body.into(),
            kind,
            priority,
            category,
            created_at,
            read_at: None,
            archived_at: None,
            expires_at: None,
        }
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), NotificationValidationError> {
        if self.recipient.trim().is_empty() {
            return Err(NotificationValidationError::EmptyRecipient);
        }
        if self.title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= self.created_at {
                return Err(NotificationValidationError::ExpiryBeforeCreation {
                    created_at: self.created_at,
                    expires_at,
                });
            }
        }
        Ok(())
    }

    /// Marks the notification read. Idempotent: a later call keeps the
    /// original timestamp.
    pub fn mark_read(&mut self, now_ms: i64) {
        self.read_at.get_or_insert(now_ms);
    }

    /// Archives the notification. Idempotent like [`Self::mark_read`].
    pub fn archive(&mut self, now_ms: i64) {
        self.archived_at.get_or_insert(now_ms);
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Returns whether this notification has expired at `now_ms`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now_ms)
    }
}

/// Notification validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyRecipient,
    EmptyTitle,
    ExpiryBeforeCreation { created_at: i64, expires_at: i64 },
}

impl Display for NotificationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRecipient => write!(f, "notification recipient must not be empty"),
            Self::EmptyTitle => write!(f, "notification title must not be empty"),
            Self::ExpiryBeforeCreation {
                created_at,
                expires_at,
            } => write!(
                f,
                "notification expiry {expires_at} must be after creation {created_at}"
            ),
        }
    }
}

impl Error for NotificationValidationError {}
