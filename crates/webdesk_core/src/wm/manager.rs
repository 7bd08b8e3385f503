//! In-memory window registry and stacking rules.
//!
//! # Responsibility
//! - Track window records, the active window and the z-order counter.
//! - Implement open/close/focus/minimize/maximize/restore/move/resize/snap.
//!
//! # Invariants
//! - At most one window is active; when set and visible it holds the maximum
//!   z-order among visible windows.
//! - `move_to`/`resize` never clamp: viewport clamping is the input layer's
//!   contract, keeping the state layer pure.
//!
//! # See also
//! - `crate::service::session_service` for persistence round-trips.

use crate::model::window::{
    Geometry, Position, Size, SnapState, WindowId, WindowRecord, WindowValidationError,
};
use log::{debug, info};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Desktop viewport extent used for maximize and snap geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Open request for one new window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub title: String,
    pub module_id: String,
    pub content_ref: String,
    pub position: Position,
    pub size: Size,
}

/// Authoritative registry of open windows.
///
/// All id-based operations silently ignore unknown ids; queries return
/// `Option`. The manager is synchronous and single-owner: the shell calls it
/// from its event loop and reads records back for rendering.
#[derive(Debug)]
pub struct WindowManager {
    windows: BTreeMap<WindowId, WindowRecord>,
    active: Option<WindowId>,
    next_z: u64,
    viewport: Viewport,
}

impl WindowManager {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            windows: BTreeMap::new(),
            active: None,
            next_z: 1,
            viewport,
        }
    }

    /// Rebuilds a manager from previously persisted records.
    ///
    /// Records keep their ids and z-order values; the counter resumes past
    /// the highest persisted z-order and the top visible window becomes
    /// active. Later records win on (unexpected) duplicate ids.
    pub fn from_records(viewport: Viewport, records: Vec<WindowRecord>) -> Self {
        let mut manager = Self::new(viewport);
        for record in records {
            manager.next_z = manager.next_z.max(record.z_order + 1);
            manager.windows.insert(record.id, record);
        }
        manager.active = manager
            .windows
            .values()
            .filter(|window| window.is_visible())
            .max_by_key(|window| window.z_order)
            .map(|window| window.id);
        manager
    }

    /// Opens a new window and makes it active.
    ///
    /// The new window receives a fresh id and the next z-order. There is no
    /// window-count cap here: a soft cap is shell policy, not core state.
    pub fn open(&mut self, request: OpenRequest) -> Result<WindowId, WindowValidationError> {
        let record = WindowRecord {
            id: Uuid::new_v4(),
            title: request.title,
            module_id: request.module_id,
            content_ref: request.content_ref,
            position: request.position,
            size: request.size,
            z_order: 0,
            minimized: false,
            maximized: false,
            snap: SnapState::None,
            prev_geometry: None,
        };
        record.validate()?;

        let id = record.id;
        let z_order = self.bump_z();
        let mut record = record;
        record.z_order = z_order;
        self.windows.insert(id, record);
        self.active = Some(id);
        info!("event=window_open module=wm status=ok window_id={id} z_order={z_order}");
        Ok(id)
    }

    /// Removes a window entirely. Terminal: there is no soft delete.
    pub fn close(&mut self, id: WindowId) {
        if self.windows.remove(&id).is_none() {
            debug!("event=window_close module=wm status=noop window_id={id}");
            return;
        }
        if self.active == Some(id) {
            // The shell decides what gets focus next; core only drops the
            // stale active reference.
            self.active = self.top_visible_id();
        }
        info!("event=window_close module=wm status=ok window_id={id}");
    }

    /// Raises a window to the top of the stack and activates it.
    ///
    /// Also clears the minimized flag. Focusing the already-active window is
    /// idempotent apart from the z-order bump.
    pub fn focus(&mut self, id: WindowId) {
        let z_order = self.next_z;
        let Some(window) = self.windows.get_mut(&id) else {
            debug!("event=window_focus module=wm status=noop window_id={id}");
            return;
        };
        window.z_order = z_order;
        window.minimized = false;
        self.next_z += 1;
        self.active = Some(id);
    }

    /// Minimizes a window, saving its geometry for a later restore.
    ///
    /// Does not change z-order, the active id, or the maximize/snap flags:
    /// minimized is orthogonal to them.
    pub fn minimize(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if !window.minimized {
            window.prev_geometry = Some(window.geometry());
        }
        window.minimized = true;
    }

    /// Toggles between free-form and full-viewport geometry.
    pub fn maximize(&mut self, id: WindowId) {
        let viewport = self.viewport;
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };

        if window.maximized {
            if let Some(previous) = window.prev_geometry.take() {
                window.apply_geometry(previous);
            }
            window.maximized = false;
            window.snap = SnapState::None;
            return;
        }

        window.prev_geometry = Some(window.geometry());
        window.position = Position::new(0, 0);
        window.size = Size::new(viewport.width, viewport.height);
        window.maximized = true;
        window.snap = SnapState::None;
    }

    /// Unminimizes a window, reapplies saved geometry and raises it.
    pub fn restore(&mut self, id: WindowId) {
        let z_order = self.next_z;
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.minimized = false;
        if let Some(previous) = window.prev_geometry.take() {
            window.apply_geometry(previous);
        }
        window.maximized = false;
        window.snap = SnapState::None;
        window.z_order = z_order;
        self.next_z += 1;
        self.active = Some(id);
    }

    /// Moves a window without clamping. Off-screen placement is allowed.
    pub fn move_to(&mut self, id: WindowId, position: Position) {
        if let Some(window) = self.windows.get_mut(&id) {
            window.position = position;
        }
    }

    /// Resizes a window without clamping. Zero extents are ignored.
    pub fn resize(&mut self, id: WindowId, size: Size) {
        if size.width == 0 || size.height == 0 {
            debug!("event=window_resize module=wm status=noop window_id={id} reason=zero_size");
            return;
        }
        if let Some(window) = self.windows.get_mut(&id) {
            window.size = size;
        }
    }

    /// Snaps a window to the left half of the viewport.
    pub fn snap_left(&mut self, id: WindowId) {
        self.snap(id, SnapState::Left);
    }

    /// Snaps a window to the right half of the viewport.
    pub fn snap_right(&mut self, id: WindowId) {
        self.snap(id, SnapState::Right);
    }

    fn snap(&mut self, id: WindowId, side: SnapState) {
        let viewport = self.viewport;
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };

        // Save free-form geometry only on the first snap in a sequence, so
        // left -> right -> restore returns to the original placement.
        if window.snap == SnapState::None && !window.maximized {
            window.prev_geometry = Some(window.geometry());
        }

        let half_width = viewport.width / 2;
        let x = match side {
            SnapState::Left => 0,
            SnapState::Right => half_width as i32,
            SnapState::None => unreachable!("snap is only called with a side"),
        };
        window.position = Position::new(x, 0);
        window.size = Size::new(half_width, viewport.height);
        window.maximized = false;
        window.snap = side;
    }

    /// Replaces the viewport used by subsequent maximize/snap calls.
    ///
    /// Existing geometry is left untouched; the shell re-snaps or
    /// re-maximizes affected windows if it wants reflow.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.get(&id)
    }

    pub fn active_id(&self) -> Option<WindowId> {
        self.active
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    /// Returns all windows in stacking order, bottom to top.
    pub fn stacked(&self) -> Vec<&WindowRecord> {
        let mut windows: Vec<&WindowRecord> = self.windows.values().collect();
        windows.sort_by_key(|window| window.z_order);
        windows
    }

    fn bump_z(&mut self) -> u64 {
        let z_order = self.next_z;
        self.next_z += 1;
        z_order
    }

    fn top_visible_id(&self) -> Option<WindowId> {
        self.windows
            .values()
            .filter(|window| window.is_visible())
            .max_by_key(|window| window.z_order)
            .map(|window| window.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{OpenRequest, Viewport, WindowManager};
    use crate::model::window::{Position, Size, SnapState, WindowValidationError};
    use uuid::Uuid;

    fn manager() -> WindowManager {
        WindowManager::new(Viewport::new(1920, 1080))
    }

    fn request(title: &str) -> OpenRequest {
        OpenRequest {
            title: title.to_string(),
            module_id: "system.files".to_string(),
            content_ref: format!("files://{title}"),
            position: Position::new(100, 80),
            size: Size::new(800, 600),
        }
    }

    #[test]
    fn open_assigns_unique_ids_and_increasing_z() {
        let mut wm = manager();
        let a = wm.open(request("a")).expect("open a");
        let b = wm.open(request("b")).expect("open b");

        assert_ne!(a, b);
        assert!(wm.get(b).expect("b").z_order > wm.get(a).expect("a").z_order);
        assert_eq!(wm.active_id(), Some(b));
    }

    #[test]
    fn open_rejects_invalid_request() {
        let mut wm = manager();
        let mut bad = request("a");
        bad.size = Size::new(0, 600);
        assert!(matches!(
            wm.open(bad),
            Err(WindowValidationError::ZeroSize { .. })
        ));
        assert!(wm.is_empty());
    }

    #[test]
    fn unknown_id_operations_are_noops() {
        let mut wm = manager();
        let stale = Uuid::new_v4();
        wm.close(stale);
        wm.focus(stale);
        wm.minimize(stale);
        wm.maximize(stale);
        wm.restore(stale);
        wm.move_to(stale, Position::new(1, 1));
        wm.resize(stale, Size::new(10, 10));
        wm.snap_left(stale);
        assert!(wm.is_empty());
        assert_eq!(wm.active_id(), None);
    }

    #[test]
    fn focus_raises_above_every_other_window() {
        let mut wm = manager();
        let a = wm.open(request("a")).expect("open a");
        let b = wm.open(request("b")).expect("open b");
        let c = wm.open(request("c")).expect("open c");

        wm.focus(a);
        let z_a = wm.get(a).expect("a").z_order;
        for other in [b, c] {
            assert!(z_a > wm.get(other).expect("other").z_order);
        }
        assert_eq!(wm.active_id(), Some(a));
    }

    #[test]
    fn close_active_window_promotes_top_visible() {
        let mut wm = manager();
        let a = wm.open(request("a")).expect("open a");
        let b = wm.open(request("b")).expect("open b");

        wm.close(b);
        assert_eq!(wm.active_id(), Some(a));
        assert!(!wm.contains(b));

        wm.close(a);
        assert_eq!(wm.active_id(), None);
    }

    #[test]
    fn maximize_twice_round_trips_geometry() {
        let mut wm = manager();
        let id = wm.open(request("a")).expect("open");

        wm.maximize(id);
        {
            let window = wm.get(id).expect("window");
            assert!(window.maximized);
            assert_eq!(window.position, Position::new(0, 0));
            assert_eq!(window.size, Size::new(1920, 1080));
        }

        wm.maximize(id);
        let window = wm.get(id).expect("window");
        assert!(!window.maximized);
        assert_eq!(window.position, Position::new(100, 80));
        assert_eq!(window.size, Size::new(800, 600));
    }

    #[test]
    fn snap_left_then_right_then_restore_returns_presnap_geometry() {
        let mut wm = manager();
        let id = wm.open(request("a")).expect("open");

        wm.snap_left(id);
        {
            let window = wm.get(id).expect("window");
            assert_eq!(window.snap, SnapState::Left);
            assert_eq!(window.position, Position::new(0, 0));
            assert_eq!(window.size, Size::new(960, 1080));
        }

        wm.snap_right(id);
        {
            let window = wm.get(id).expect("window");
            assert_eq!(window.snap, SnapState::Right);
            assert_eq!(window.position, Position::new(960, 0));
        }

        wm.restore(id);
        let window = wm.get(id).expect("window");
        assert_eq!(window.snap, SnapState::None);
        assert_eq!(window.position, Position::new(100, 80));
        assert_eq!(window.size, Size::new(800, 600));
    }

    #[test]
    fn minimize_keeps_z_order_and_flags() {
        let mut wm = manager();
        let id = wm.open(request("a")).expect("open");
        wm.maximize(id);
        let z_before = wm.get(id).expect("window").z_order;

        wm.minimize(id);
        let window = wm.get(id).expect("window");
        assert!(window.minimized);
        assert!(window.maximized, "minimized is orthogonal to maximized");
        assert_eq!(window.z_order, z_before);
    }

    #[test]
    fn restore_clears_minimized_and_raises() {
        let mut wm = manager();
        let a = wm.open(request("a")).expect("open a");
        let b = wm.open(request("b")).expect("open b");

        wm.minimize(a);
        wm.restore(a);
        let restored = wm.get(a).expect("a");
        assert!(!restored.minimized);
        assert!(restored.z_order > wm.get(b).expect("b").z_order);
        assert_eq!(wm.active_id(), Some(a));
    }

    #[test]
    fn move_and_resize_do_not_clamp() {
        let mut wm = manager();
        let id = wm.open(request("a")).expect("open");

        wm.move_to(id, Position::new(-500, 4000));
        wm.resize(id, Size::new(6000, 4000));

        let window = wm.get(id).expect("window");
        assert_eq!(window.position, Position::new(-500, 4000));
        assert_eq!(window.size, Size::new(6000, 4000));
    }

    #[test]
    fn stacked_returns_bottom_to_top() {
        let mut wm = manager();
        let a = wm.open(request("a")).expect("open a");
        let b = wm.open(request("b")).expect("open b");
        wm.focus(a);

        let order: Vec<_> = wm.stacked().iter().map(|window| window.id).collect();
        assert_eq!(order, vec![b, a]);
    }
}
