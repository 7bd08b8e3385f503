use webdesk_core::db::open_db_in_memory;
use webdesk_core::{
    LayoutRepository, OpenRequest, Position, RepoError, SessionService, Size, SnapState,
    SqliteLayoutRepository, Viewport, WindowManager,
};

fn request(title: &str) -> OpenRequest {
    OpenRequest {
        title: title.to_string(),
        module_id: "system.files".to_string(),
        content_ref: format!("files://{title}"),
        position: Position::new(120, 90),
        size: Size::new(800, 600),
    }
}

#[test]
fn session_round_trip_preserves_ids_geometry_and_flags() {
    let conn = open_db_in_memory().unwrap();
    let service = SessionService::new(SqliteLayoutRepository::try_new(&conn).unwrap());

    let mut wm = WindowManager::new(Viewport::new(1920, 1080));
    let files = wm.open(request("files")).unwrap();
    let editor = wm.open(request("editor")).unwrap();
    wm.snap_left(files);
    wm.maximize(editor);
    wm.minimize(editor);

    service.save_session(&wm).unwrap();
    let restored = service.restore_session(Viewport::new(1920, 1080)).unwrap();

    assert_eq!(restored.len(), 2);

    let files_back = restored.get(files).unwrap();
    assert_eq!(files_back.snap, SnapState::Left);
    assert_eq!(files_back.position, Position::new(0, 0));
    assert_eq!(files_back.size, Size::new(960, 1080));
    assert_eq!(
        files_back.prev_geometry.unwrap().position,
        Position::new(120, 90)
    );

    let editor_back = restored.get(editor).unwrap();
    assert!(editor_back.minimized);
    assert!(editor_back.maximized);

    // The minimized editor cannot be active; the snapped files window is.
    assert_eq!(restored.active_id(), Some(files));
}

#[test]
fn restored_manager_resumes_z_order_past_stored_windows() {
    let conn = open_db_in_memory().unwrap();
    let service = SessionService::new(SqliteLayoutRepository::try_new(&conn).unwrap());

    let mut wm = WindowManager::new(Viewport::new(1280, 720));
    let a = wm.open(request("a")).unwrap();
    let b = wm.open(request("b")).unwrap();
    wm.focus(a);
    service.save_session(&wm).unwrap();

    let mut restored = service.restore_session(Viewport::new(1280, 720)).unwrap();
    let c = restored.open(request("c")).unwrap();

    let z_c = restored.get(c).unwrap().z_order;
    for existing in [a, b] {
        assert!(z_c > restored.get(existing).unwrap().z_order);
    }
}

#[test]
fn save_replaces_previous_layout_instead_of_appending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLayoutRepository::try_new(&conn).unwrap();
    let service = SessionService::new(SqliteLayoutRepository::try_new(&conn).unwrap());

    let mut wm = WindowManager::new(Viewport::new(1280, 720));
    let a = wm.open(request("a")).unwrap();
    wm.open(request("b")).unwrap();
    service.save_session(&wm).unwrap();

    wm.close(a);
    service.save_session(&wm).unwrap();

    let stored = repo.load_layout().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(repo.get_window(a).unwrap().is_none());
}

#[test]
fn clear_session_empties_the_stored_layout() {
    let conn = open_db_in_memory().unwrap();
    let service = SessionService::new(SqliteLayoutRepository::try_new(&conn).unwrap());

    let mut wm = WindowManager::new(Viewport::new(1280, 720));
    wm.open(request("a")).unwrap();
    service.save_session(&wm).unwrap();
    service.clear_session().unwrap();

    let restored = service.restore_session(Viewport::new(1280, 720)).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.active_id(), None);
}

#[test]
fn load_rejects_corrupted_snap_state() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO window_layouts (
            window_id, title, module_id, content_ref,
            pos_x, pos_y, width, height, z_order,
            is_minimized, is_maximized, snap_state, saved_at
        ) VALUES (
            '0d4e94a2-4a6b-4f6e-9d7e-0a8c25b1d001', 'files', 'system.files', 'files://x',
            0, 0, 800, 600, 1,
            0, 0, 'bottom', 1000
        );",
        [],
    )
    .unwrap();

    let repo = SqliteLayoutRepository::try_new(&conn).unwrap();
    let err = repo.load_layout().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
