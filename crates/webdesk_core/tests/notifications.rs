use webdesk_core::db::open_db_in_memory;
use webdesk_core::{
    NotificationCategory, NotificationKind, NotificationPriority, NotificationQuery,
    NotificationRepository, NotificationService, NotifyRequest, SqliteNotificationRepository,
};

fn notify_request(title: &str) -> NotifyRequest {
    NotifyRequest {
        recipient: "user-1".to_string(),
        title: title.to_string(),
        body: format!("{title} body"),
        kind: NotificationKind::Info,
        priority: NotificationPriority::Normal,
        category: NotificationCategory::System,
        expires_at: None,
    }
}

#[test]
fn notify_and_get_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let service = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap());

    let id = service.notify(&notify_request("welcome")).unwrap();
    let loaded = service.get(id).unwrap().unwrap();

    assert_eq!(loaded.id, id);
    assert_eq!(loaded.recipient, "user-1");
    assert_eq!(loaded.kind, NotificationKind::Info);
    assert!(loaded.read_at.is_none());
    assert!(loaded.archived_at.is_none());
}

#[test]
fn list_is_newest_first_and_respects_filters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();
    let service = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap());

    let first = service.notify(&notify_request("first")).unwrap();
    let second = service.notify(&notify_request("second")).unwrap();
    // Force distinct creation times so ordering is deterministic.
    conn.execute(
        "UPDATE notifications SET created_at = 1000 WHERE id = ?1;",
        [first.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE notifications SET created_at = 2000 WHERE id = ?1;",
        [second.to_string()],
    )
    .unwrap();

    let all = repo
        .list(&NotificationQuery {
            recipient: "user-1".to_string(),
            ..NotificationQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second);
    assert_eq!(all[1].id, first);

    repo.mark_read(first, 3000).unwrap();
    let unread = repo
        .list(&NotificationQuery {
            recipient: "user-1".to_string(),
            unread_only: true,
            ..NotificationQuery::default()
        })
        .unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, second);

    let other_recipient = repo
        .list(&NotificationQuery {
            recipient: "user-2".to_string(),
            ..NotificationQuery::default()
        })
        .unwrap();
    assert!(other_recipient.is_empty());
}

#[test]
fn mark_read_and_archive_keep_the_first_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();
    let service = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap());

    let id = service.notify(&notify_request("once")).unwrap();

    repo.mark_read(id, 1000).unwrap();
    repo.mark_read(id, 9999).unwrap();
    repo.archive(id, 2000).unwrap();
    repo.archive(id, 9999).unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.read_at, Some(1000));
    assert_eq!(loaded.archived_at, Some(2000));
}

#[test]
fn unread_count_excludes_read_and_archived() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();
    let service = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap());

    let a = service.notify(&notify_request("a")).unwrap();
    let b = service.notify(&notify_request("b")).unwrap();
    service.notify(&notify_request("c")).unwrap();
    assert_eq!(service.unread_count("user-1").unwrap(), 3);

    repo.mark_read(a, 1000).unwrap();
    repo.archive(b, 1000).unwrap();
    assert_eq!(service.unread_count("user-1").unwrap(), 1);
}

#[test]
fn purge_expired_removes_only_past_expiries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();
    let service = NotificationService::new(SqliteNotificationRepository::try_new(&conn).unwrap());

    let mut expiring = notify_request("expiring");
    expiring.expires_at = Some(1_000);
    let expiring_id = service.notify(&expiring).unwrap();

    let mut future = notify_request("future");
    future.expires_at = Some(i64::MAX);
    let future_id = service.notify(&future).unwrap();

    let keeper_id = service.notify(&notify_request("keeper")).unwrap();

    let removed = repo.purge_expired(2_000).unwrap();
    assert_eq!(removed, 1);
    assert!(repo.get(expiring_id).unwrap().is_none());
    assert!(repo.get(future_id).unwrap().is_some());
    assert!(repo.get(keeper_id).unwrap().is_some());
}

#[test]
fn unknown_ids_surface_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNotificationRepository::try_new(&conn).unwrap();

    let missing = uuid::Uuid::new_v4();
    assert!(repo.get(missing).unwrap().is_none());
    assert!(repo.mark_read(missing, 1000).is_err());
    assert!(repo.archive(missing, 1000).is_err());
}
