use memos_store::db::migrations::latest_version;
use memos_store::db::{open_db, open_db_in_memory, DbError, APPLICATION_ID};
use memos_store::driver::MaintenanceDriver;
use memos_store::{Context, DriverError, SqliteDriver};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "user",
        "memo",
        "memo_organizer",
        "memo_relation",
        "resource",
        "activity",
        "tag",
        "system_setting",
        "user_setting",
        "idp",
        "storage",
        "user_setting_v1",
    ] {
        assert_table_exists(&conn, table);
    }
    assert_eq!(application_id(&conn), APPLICATION_ID);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memos.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "memo");
}

#[test]
fn driver_migrate_twice_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memos.db");
    let ctx = Context::background();
    let driver = SqliteDriver::open(&path).unwrap();

    driver.migrate(&ctx).unwrap();
    let tables_after_first = table_names(&path);
    driver.migrate(&ctx).unwrap();

    assert_eq!(driver.schema_version(&ctx).unwrap(), latest_version());
    assert_eq!(table_names(&path), tables_after_first);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let driver = SqliteDriver::open(&path).unwrap();
    let err = driver.migrate(&Context::background()).unwrap_err();
    assert!(matches!(
        err,
        DriverError::SchemaMismatch {
            db_version: 999,
            ..
        }
    ));
}

#[test]
fn foreign_database_is_not_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA application_id = 1234; CREATE TABLE things (id INTEGER);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::ForeignDatabase {
            application_id: 1234
        }
    ));
}

#[test]
fn cancelled_migration_leaves_schema_untouched() {
    let driver = SqliteDriver::open_in_memory().unwrap();
    let ctx = Context::background();
    ctx.cancel();

    assert!(matches!(
        driver.migrate(&ctx).unwrap_err(),
        DriverError::Cancelled
    ));
    assert_eq!(driver.schema_version(&Context::background()).unwrap(), 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn application_id(conn: &Connection) -> i32 {
    conn.query_row("PRAGMA application_id;", [], |row| row.get(0))
        .unwrap()
}

fn table_names(path: &std::path::Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
