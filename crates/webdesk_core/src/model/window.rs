//! Window domain model.
//!
//! # Responsibility
//! - Define the canonical record for one desktop window.
//! - Provide geometry/flag helpers shared by the manager and persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another window.
//! - `z_order` values are assigned by the manager and unique within it.
//! - `prev_geometry` holds the last free-form geometry saved before a
//!   maximize/snap/minimize transition, or `None`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every window managed by core.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type WindowId = Uuid;

/// Top-left corner of a window in desktop pixels.
///
/// Coordinates may be negative: the state layer does not clamp to the
/// viewport, that contract belongs to the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Window extent in desktop pixels. Zero-sized windows are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Free-form geometry snapshot used for maximize/snap round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub position: Position,
    pub size: Size,
}

/// Edge-snap state of one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapState {
    /// Free-form geometry.
    #[default]
    None,
    /// Left half of the viewport.
    Left,
    /// Right half of the viewport.
    Right,
}

impl SnapState {
    /// Stable string id used in persisted layout rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parses one snap state from its persisted string value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Canonical state of one desktop window.
///
/// The record is pure data: all transitions live in the window manager so one
/// code path owns stacking and geometry rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Stable global ID used for persistence and shell references.
    pub id: WindowId,
    /// Title shown by the shell. Not unique and never used as a key.
    pub title: String,
    /// Identifier of the module that owns this window's content.
    pub module_id: String,
    /// Opaque content reference; the manager never interprets it.
    pub content_ref: String,
    pub position: Position,
    pub size: Size,
    /// Stacking order; higher draws on top. Assigned by the manager.
    pub z_order: u64,
    pub minimized: bool,
    pub maximized: bool,
    pub snap: SnapState,
    /// Free-form geometry saved before the last maximize/snap/minimize.
    pub prev_geometry: Option<Geometry>,
}

impl WindowRecord {
    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), WindowValidationError> {
        if self.title.trim().is_empty() {
            return Err(WindowValidationError::EmptyTitle);
        }
        if self.module_id.trim().is_empty() {
            return Err(WindowValidationError::EmptyModuleId);
        }
        if self.size.width == 0 || self.size.height == 0 {
            return Err(WindowValidationError::ZeroSize {
                width: self.size.width,
                height: self.size.height,
            });
        }
        Ok(())
    }

    /// Returns the current free-form geometry of this window.
    pub fn geometry(&self) -> Geometry {
        Geometry {
            position: self.position,
            size: self.size,
        }
    }

    /// Applies a geometry snapshot to position and size.
    pub fn apply_geometry(&mut self, geometry: Geometry) {
        self.position = geometry.position;
        self.size = geometry.size;
    }

    /// Returns whether the window takes part in visible stacking.
    pub fn is_visible(&self) -> bool {
        !self.minimized
    }
}

/// Window record validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowValidationError {
    EmptyTitle,
    EmptyModuleId,
    ZeroSize { width: u32, height: u32 },
}

impl Display for WindowValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "window title must not be empty"),
            Self::EmptyModuleId => write!(f, "window module_id must not be empty"),
            Self::ZeroSize { width, height } => {
                write!(f, "window size must be non-zero, got {width}x{height}")
            }
        }
    }
}

impl Error for WindowValidationError {}

#[cfg(test)]
mod tests {
    use super::{Geometry, Position, Size, SnapState, WindowRecord, WindowValidationError};
    use uuid::Uuid;

    fn record() -> WindowRecord {
        WindowRecord {
            id: Uuid::new_v4(),
            title: "Terminal".to_string(),
            module_id: "system.terminal".to_string(),
            content_ref: "terminal://0".to_string(),
            position: Position::new(40, 40),
            size: Size::new(640, 480),
            z_order: 1,
            minimized: false,
            maximized: false,
            snap: SnapState::None,
            prev_geometry: None,
        }
    }

    #[test]
    fn validates_baseline_record() {
        assert!(record().validate().is_ok());
    }

    #[test]
    fn rejects_empty_title_and_zero_size() {
        let mut no_title = record();
        no_title.title = "   ".to_string();
        assert_eq!(
            no_title.validate().unwrap_err(),
            WindowValidationError::EmptyTitle
        );

        let mut flat = record();
        flat.size = Size::new(640, 0);
        assert!(matches!(
            flat.validate().unwrap_err(),
            WindowValidationError::ZeroSize { .. }
        ));
    }

    #[test]
    fn geometry_round_trips_through_apply() {
        let mut window = record();
        let saved = window.geometry();
        window.apply_geometry(Geometry {
            position: Position::new(0, 0),
            size: Size::new(1920, 1080),
        });
        window.apply_geometry(saved);
        assert_eq!(window.position, Position::new(40, 40));
        assert_eq!(window.size, Size::new(640, 480));
    }

    #[test]
    fn snap_state_string_mapping_is_stable() {
        for state in [SnapState::None, SnapState::Left, SnapState::Right] {
            assert_eq!(SnapState::parse(state.as_str()), Some(state));
        }
        assert_eq!(SnapState::parse("bottom"), None);
    }
}
