//! Browser-facing bindings for the desktop core.
//!
//! # Responsibility
//! - Expose window management and the formula engine to JavaScript through
//!   thin, panic-free handles.
//!
//! # Invariants
//! - No call across this boundary panics: malformed ids and references are
//!   ignored or reported as empty results, mirroring the core's no-op
//!   contract for unknown windows.
//! - Structured results cross as JSON strings; the shell owns presentation.

use uuid::Uuid;
use wasm_bindgen::prelude::*;
use webdesk_core::{
    CellCoord, OpenRequest, Position, SheetEngine, Size, Viewport, WindowId, WindowManager,
};

/// Returns the core crate version for shell diagnostics.
#[wasm_bindgen]
pub fn core_version() -> String {
    webdesk_core::core_version().to_string()
}

/// One desktop session owned by the shell.
#[wasm_bindgen]
pub struct DesktopHandle {
    manager: WindowManager,
}

#[wasm_bindgen]
impl DesktopHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            manager: WindowManager::new(Viewport::new(viewport_width, viewport_height)),
        }
    }

    /// Opens a window; returns its id, or an empty string when the request
    /// is invalid.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        title: &str,
        module_id: &str,
        content_ref: &str,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> String {
        let request = OpenRequest {
            title: title.to_string(),
            module_id: module_id.to_string(),
            content_ref: content_ref.to_string(),
            position: Position::new(x, y),
            size: Size::new(width, height),
        };
        match self.manager.open(request) {
            Ok(id) => id.to_string(),
            Err(_) => String::new(),
        }
    }

    pub fn close(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.close(id);
        }
    }

    pub fn focus(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.focus(id);
        }
    }

    pub fn minimize(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.minimize(id);
        }
    }

    pub fn maximize(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.maximize(id);
        }
    }

    pub fn restore(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.restore(id);
        }
    }

    pub fn move_to(&mut self, id: &str, x: i32, y: i32) {
        if let Some(id) = parse_window_id(id) {
            self.manager.move_to(id, Position::new(x, y));
        }
    }

    pub fn resize(&mut self, id: &str, width: u32, height: u32) {
        if let Some(id) = parse_window_id(id) {
            self.manager.resize(id, Size::new(width, height));
        }
    }

    pub fn snap_left(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.snap_left(id);
        }
    }

    pub fn snap_right(&mut self, id: &str) {
        if let Some(id) = parse_window_id(id) {
            self.manager.snap_right(id);
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.manager.set_viewport(Viewport::new(width, height));
    }

    /// Active window id, or an empty string when none is active.
    pub fn active_id(&self) -> String {
        self.manager
            .active_id()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    pub fn window_count(&self) -> usize {
        self.manager.len()
    }

    /// All windows in stacking order, bottom to top, as a JSON array.
    pub fn windows_json(&self) -> String {
        serde_json::to_string(&self.manager.stacked()).unwrap_or_else(|_| "[]".to_string())
    }
}

/// One spreadsheet owned by the shell.
#[wasm_bindgen]
#[derive(Default)]
pub struct SheetHandle {
    engine: SheetEngine,
}

#[wasm_bindgen]
impl SheetHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw input into a cell; returns false for a malformed
    /// reference.
    pub fn set_cell(&mut self, reference: &str, raw: &str) -> bool {
        let Ok(coord) = CellCoord::parse(reference) else {
            return false;
        };
        self.engine.set_cell(coord, raw);
        true
    }

    pub fn remove_cell(&mut self, reference: &str) {
        if let Ok(coord) = CellCoord::parse(reference) {
            self.engine.remove_cell(coord);
        }
    }

    /// Evaluated display text for one cell; errors render as sentinels
    /// (`#CYCLE!`, `#DIV/0!`, ...). Malformed references display blank.
    pub fn display_text(&self, reference: &str) -> String {
        match CellCoord::parse(reference) {
            Ok(coord) => self.engine.get_value(coord).display_text(),
            Err(_) => String::new(),
        }
    }

    /// Evaluated value for one cell as tagged JSON.
    pub fn value_json(&self, reference: &str) -> String {
        match CellCoord::parse(reference) {
            Ok(coord) => serde_json::to_string(&self.engine.get_value(coord))
                .unwrap_or_else(|_| "null".to_string()),
            Err(_) => "null".to_string(),
        }
    }

    /// Raw text as entered for one cell (formulas keep their `=` source).
    pub fn raw_text(&self, reference: &str) -> String {
        match CellCoord::parse(reference) {
            Ok(coord) => self.engine.raw_text(coord),
            Err(_) => String::new(),
        }
    }

    /// Recalculates every formula cell; returns a JSON array of
    /// `[reference, display_text]` pairs in evaluation order.
    pub fn recalculate_json(&self) -> String {
        let results: Vec<(String, String)> = self
            .engine
            .recalculate_all()
            .into_iter()
            .map(|(coord, value)| (coord.to_string(), value.display_text()))
            .collect();
        serde_json::to_string(&results).unwrap_or_else(|_| "[]".to_string())
    }
}

fn parse_window_id(id: &str) -> Option<WindowId> {
    Uuid::parse_str(id.trim()).ok()
}
