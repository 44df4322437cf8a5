//! SQLite driver: the reference backend for the driver contract.
//!
//! # Responsibility
//! - Own the physical connection and serialize access to it.
//! - Translate entity descriptors into parameterized SQLite statements.
//! - Run migrations, vacuum and online backups.
//!
//! # Invariants
//! - Every call runs with the caller's `Context` wired into a progress
//!   handler, so cancellation interrupts the running statement.
//! - After `close`, every call fails with `Unavailable`.
//! - File databases run in WAL mode; backups read through a second
//!   connection so writers keep going.

use crate::context::Context;
use crate::db::migrations::{apply_migrations, current_user_version, latest_version};
use crate::db::{self, DbError};
use crate::driver::{DriverError, DriverKind, DriverResult, MaintenanceDriver};
use crate::model::RowStatus;
use log::{error, info, warn};
use rusqlite::{Connection, Params, Row};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

mod activity;
mod backup;
mod idp;
mod memo;
mod memo_organizer;
mod memo_relation;
mod query;
mod resource;
mod setting;
mod storage;
mod tag;
mod user;

pub use backup::{restore_backup, verify_backup};

/// Dsn selecting a private in-memory database.
pub const IN_MEMORY_DSN: &str = ":memory:";

/// Virtual machine steps between cancellation checks.
const PROGRESS_HANDLER_OPS: i32 = 1_000;

/// Orphan cleanup run by `vacuum`, parents before children.
const VACUUM_ORPHAN_SQL: &[&str] = &[
    "DELETE FROM memo WHERE creator_id NOT IN (SELECT id FROM user);",
    "DELETE FROM memo_organizer
     WHERE memo_id NOT IN (SELECT id FROM memo)
        OR user_id NOT IN (SELECT id FROM user);",
    "DELETE FROM memo_relation
     WHERE memo_id NOT IN (SELECT id FROM memo)
        OR related_memo_id NOT IN (SELECT id FROM memo);",
    "DELETE FROM resource WHERE creator_id NOT IN (SELECT id FROM user);",
    "UPDATE resource
     SET memo_id = NULL
     WHERE memo_id IS NOT NULL
       AND memo_id NOT IN (SELECT id FROM memo);",
    "DELETE FROM tag WHERE creator_id NOT IN (SELECT id FROM user);",
    "DELETE FROM user_setting WHERE user_id NOT IN (SELECT id FROM user);",
    "DELETE FROM user_setting_v1 WHERE user_id NOT IN (SELECT id FROM user);",
];

/// SQLite-backed implementation of the full driver contract.
pub struct SqliteDriver {
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
    migrating: AtomicBool,
}

impl SqliteDriver {
    /// Opens (creating if needed) a database file. Does not migrate.
    pub fn open(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let conn = db::connect(path).map_err(open_error)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(Some(conn)),
            migrating: AtomicBool::new(false),
        })
    }

    /// Opens a private in-memory database. Does not migrate.
    pub fn open_in_memory() -> DriverResult<Self> {
        let conn = db::connect_in_memory().map_err(open_error)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(Some(conn)),
            migrating: AtomicBool::new(false),
        })
    }

    /// Database file path; `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        match self.conn.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => true,
        }
    }

    /// Whether a `migrate` call is currently running or waiting for the
    /// connection.
    pub fn is_migrating(&self) -> bool {
        self.migrating.load(Ordering::SeqCst)
    }

    /// Reads the schema version marker of the live database.
    pub fn schema_version(&self, ctx: &Context) -> DriverResult<u32> {
        self.with_connection(ctx, |conn| Ok(current_user_version(conn)?))
    }

    /// Runs `f` with exclusive use of the physical connection.
    ///
    /// The connection is released when `f` returns; the progress handler
    /// installed for `ctx` is removed before release.
    pub fn with_connection<T>(
        &self,
        ctx: &Context,
        f: impl FnOnce(&mut Connection) -> DriverResult<T>,
    ) -> DriverResult<T> {
        if ctx.is_done() {
            return Err(DriverError::Cancelled);
        }

        let mut guard = self
            .conn
            .lock()
            .map_err(|_| DriverError::Unavailable("connection lock poisoned".to_string()))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DriverError::Unavailable("driver is closed".to_string()))?;

        install_interrupt(conn, ctx);
        let result = f(conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        match result {
            Err(_) if ctx.is_done() => Err(DriverError::Cancelled),
            other => other,
        }
    }
}

impl MaintenanceDriver for SqliteDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn close(&self) -> DriverResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| DriverError::Unavailable("connection lock poisoned".to_string()))?;
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=driver status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                warn!("event=db_close module=driver status=error error={err}");
                Err(err.into())
            }
        }
    }

    fn migrate(&self, ctx: &Context) -> DriverResult<()> {
        let started_at = Instant::now();
        let _flag = MigrationFlag::raise(&self.migrating);

        let result = self.with_connection(ctx, |conn| {
            let before = current_user_version(conn)?;
            apply_migrations(conn)?;
            let after = current_user_version(conn)?;
            Ok((before, after))
        });

        match result {
            Ok((before, after)) => {
                info!(
                    "event=db_migrate module=driver status=ok from_version={} to_version={} latest={} duration_ms={}",
                    before,
                    after,
                    latest_version(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=db_migrate module=driver status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn vacuum(&self, ctx: &Context) -> DriverResult<()> {
        let started_at = Instant::now();
        let repaired = self.with_connection(ctx, |conn| {
            let tx = conn.transaction()?;
            let mut repaired = 0usize;
            for sql in VACUUM_ORPHAN_SQL {
                repaired += tx.execute(sql, [])?;
            }
            tx.commit()?;
            conn.execute_batch("VACUUM;")?;
            Ok(repaired)
        })?;

        info!(
            "event=db_vacuum module=driver status=ok repaired_rows={} duration_ms={}",
            repaired,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn backup_to(&self, ctx: &Context, destination: &Path) -> DriverResult<()> {
        backup::backup_to(self, ctx, destination)
    }
}

/// Marks a migration as running for the lifetime of the value.
struct MigrationFlag<'a>(&'a AtomicBool);

impl<'a> MigrationFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for MigrationFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn install_interrupt(conn: &Connection, ctx: &Context) {
    let ctx = ctx.clone();
    conn.progress_handler(PROGRESS_HANDLER_OPS, Some(move || ctx.is_done()));
}

fn open_error(err: DbError) -> DriverError {
    match err {
        DbError::Sqlite(err) => DriverError::Unavailable(err.to_string()),
        other => DriverError::from(other),
    }
}

/// Runs `sql` and maps every returned row with `parse`.
pub(crate) fn query_all<T>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
    parse: impl Fn(&Row<'_>) -> DriverResult<T>,
) -> DriverResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

/// Runs `sql` and maps the first returned row, if any.
pub(crate) fn query_one<T>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
    parse: impl Fn(&Row<'_>) -> DriverResult<T>,
) -> DriverResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn parse_row_status(value: &str, column: &str) -> DriverResult<RowStatus> {
    RowStatus::parse(value)
        .ok_or_else(|| DriverError::InvalidData(format!("invalid row status `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> DriverResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DriverError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
