//! Desktop session persistence service.
//!
//! # Responsibility
//! - Save the live window layout and rebuild a manager from a stored one.
//!
//! # Invariants
//! - A restored manager resumes z-order assignment past the highest stored
//!   value; stable window ids survive the round-trip unchanged.

use crate::model::window::WindowRecord;
use crate::repo::layout_repo::LayoutRepository;
use crate::repo::RepoResult;
use crate::wm::manager::{Viewport, WindowManager};
use chrono::Utc;
use log::info;

/// Use-case service for saving and restoring the desktop session.
pub struct SessionService<R: LayoutRepository> {
    repo: R,
}

impl<R: LayoutRepository> SessionService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists the current layout, replacing any stored one.
    pub fn save_session(&self, manager: &WindowManager) -> RepoResult<()> {
        let windows: Vec<WindowRecord> = manager.stacked().into_iter().cloned().collect();
        let saved_at = Utc::now().timestamp_millis();
        self.repo.replace_layout(&windows, saved_at)?;
        info!(
            "event=session_save module=service status=ok windows={}",
            windows.len()
        );
        Ok(())
    }

    /// Rebuilds a window manager from the stored layout.
    pub fn restore_session(&self, viewport: Viewport) -> RepoResult<WindowManager> {
        let windows = self.repo.load_layout()?;
        info!(
            "event=session_restore module=service status=ok windows={}",
            windows.len()
        );
        Ok(WindowManager::from_records(viewport, windows))
    }

    /// Drops the stored layout.
    pub fn clear_session(&self) -> RepoResult<()> {
        self.repo.clear_layout()
    }
}
