//! Core domain logic for the WebDesk desktop platform.
//! This crate is the single source of truth for business invariants.

pub mod access;
#[cfg(feature = "storage")]
pub mod db;
pub mod formula;
#[cfg(feature = "file-logging")]
pub mod logging;
pub mod model;
#[cfg(feature = "storage")]
pub mod repo;
#[cfg(feature = "storage")]
pub mod service;
pub mod wm;

pub use access::profile::{AccessProfile, ProfileError};
pub use access::verifier::{
    AccessDecision, AccessVerifier, CachedVerifier, DecisionSource, VerifierError,
};
pub use formula::coord::{CellCoord, CellRange};
pub use formula::engine::{CellContent, SheetEngine};
pub use formula::value::{EvalErrorKind, Value};
#[cfg(feature = "file-logging")]
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notification::{
    Notification, NotificationCategory, NotificationId, NotificationKind, NotificationPriority,
};
pub use model::window::{
    Geometry, Position, Size, SnapState, WindowId, WindowRecord, WindowValidationError,
};
#[cfg(feature = "storage")]
pub use repo::layout_repo::{LayoutRepository, SqliteLayoutRepository};
#[cfg(feature = "storage")]
pub use repo::notification_repo::{
    NotificationQuery, NotificationRepository, SqliteNotificationRepository,
};
#[cfg(feature = "storage")]
pub use repo::{RepoError, RepoResult};
#[cfg(feature = "storage")]
pub use service::notification_service::{NotificationService, NotifyRequest};
#[cfg(feature = "storage")]
pub use service::session_service::SessionService;
pub use wm::manager::{OpenRequest, Viewport, WindowManager};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
