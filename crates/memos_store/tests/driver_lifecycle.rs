use memos_store::driver::{MaintenanceDriver, UserDriver};
use memos_store::model::{FindUser, Role, User};
use memos_store::{
    new_driver, Context, DriverError, DriverKind, Mode, Profile, SqliteDriver, Store,
};
use std::time::Duration;

#[test]
fn close_is_idempotent_and_later_calls_are_retryable() {
    let driver = SqliteDriver::open_in_memory().unwrap();
    let ctx = Context::background();
    driver.migrate(&ctx).unwrap();

    driver.close().unwrap();
    driver.close().unwrap();
    assert!(driver.is_closed());

    let err = driver.list_users(&ctx, &FindUser::default()).unwrap_err();
    assert!(matches!(err, DriverError::Unavailable(_)));
    assert!(err.is_retryable());
}

#[test]
fn cancelled_context_short_circuits_calls() {
    let driver = SqliteDriver::open_in_memory().unwrap();
    driver.migrate(&Context::background()).unwrap();

    let ctx = Context::background();
    ctx.cancel();
    let err = driver
        .create_user(&ctx, &User::new("alice", Role::User, "hash"))
        .unwrap_err();
    assert!(matches!(err, DriverError::Cancelled));
    assert!(!err.is_retryable());

    let expired = Context::with_timeout(Duration::ZERO);
    assert!(matches!(
        driver.list_users(&expired, &FindUser::default()),
        Err(DriverError::Cancelled)
    ));

    // The connection stays usable for live contexts.
    assert!(driver
        .list_users(&Context::background(), &FindUser::default())
        .unwrap()
        .is_empty());
}

#[test]
fn new_driver_opens_file_dsn_from_profile() {
    let dir = tempfile::tempdir().unwrap();
    let profile = Profile {
        mode: Mode::Dev,
        data: dir.path().to_path_buf(),
        ..Profile::default()
    };
    let ctx = Context::background();

    let driver = new_driver(&profile).unwrap();
    assert_eq!(driver.kind(), DriverKind::Sqlite);
    driver.migrate(&ctx).unwrap();
    driver
        .create_user(&ctx, &User::new("alice", Role::Host, "hash"))
        .unwrap();
    driver.close().unwrap();

    assert!(dir.path().join("memos_dev.db").is_file());

    let reopened = new_driver(&profile).unwrap();
    reopened.migrate(&ctx).unwrap();
    let users = reopened.list_users(&ctx, &FindUser::default()).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "alice");
}

#[test]
fn store_open_migrates_and_close_releases() {
    let ctx = Context::background();
    let store = Store::open(&ctx, Profile::in_memory()).unwrap();
    assert_eq!(store.profile().driver, DriverKind::Sqlite);

    store
        .create_user(&ctx, &User::new("alice", Role::Host, "hash"))
        .unwrap();
    store.vacuum(&ctx).unwrap();
    assert!(store
        .get_user(
            &ctx,
            &FindUser {
                username: Some("alice".to_string()),
                ..FindUser::default()
            },
        )
        .unwrap()
        .is_some());

    store.close().unwrap();
    let err = store.list_users(&ctx, &FindUser::default()).unwrap_err();
    assert!(err.driver_error().is_retryable());
}

#[test]
fn vacuum_keeps_referenced_rows() {
    let dir = tempfile::tempdir().unwrap();
    let driver = SqliteDriver::open(dir.path().join("memos.db")).unwrap();
    let ctx = Context::background();
    driver.migrate(&ctx).unwrap();
    for name in ["alice", "bob"] {
        driver
            .create_user(&ctx, &User::new(name, Role::User, "hash"))
            .unwrap();
    }

    driver.vacuum(&ctx).unwrap();
    assert_eq!(
        driver.list_users(&ctx, &FindUser::default()).unwrap().len(),
        2
    );
}
