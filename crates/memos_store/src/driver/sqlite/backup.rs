//! Online backup and backup artifact checks.
//!
//! # Invariants
//! - A backup never overwrites an existing file.
//! - A failed or cancelled backup leaves no partial file behind.
//! - Artifacts are accepted only with our `application_id` and a schema
//!   version this binary understands.

use super::{install_interrupt, SqliteDriver};
use crate::context::Context;
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{self, APPLICATION_ID};
use crate::driver::{DriverError, DriverResult};
use log::{error, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::Path;
use std::time::Instant;

pub(super) fn backup_to(
    driver: &SqliteDriver,
    ctx: &Context,
    destination: &Path,
) -> DriverResult<()> {
    let started_at = Instant::now();
    if driver.is_migrating() {
        return Err(DriverError::backup_failed(
            destination,
            "schema migration in progress",
        ));
    }
    if driver.is_closed() {
        return Err(DriverError::Unavailable("driver is closed".to_string()));
    }
    if ctx.is_done() {
        return Err(DriverError::Cancelled);
    }
    check_destination(destination)?;
    let target = destination_str(destination)?;

    let result = match driver.path() {
        // A second connection reads a WAL snapshot while writers continue.
        Some(source) => snapshot_from_file(source, ctx, target),
        None => driver.with_connection(ctx, |conn| {
            conn.execute("VACUUM INTO ?1;", [target])?;
            Ok(())
        }),
    };

    match result {
        Ok(()) => {
            info!(
                "event=db_backup module=driver status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            remove_partial(destination);
            error!(
                "event=db_backup module=driver status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            if matches!(err, DriverError::Cancelled) || ctx.is_done() {
                return Err(DriverError::Cancelled);
            }
            Err(DriverError::backup_failed(destination, err))
        }
    }
}

/// Checks that `path` is a memos backup this binary can open.
///
/// Returns the schema version recorded in the artifact.
pub fn verify_backup(path: impl AsRef<Path>) -> DriverResult<u32> {
    let path = path.as_ref();
    let conn = open_existing(path)?;
    let version = verify_connection(&conn, path)?;
    info!(
        "event=backup_verify module=driver status=ok schema_version={}",
        version
    );
    Ok(version)
}

/// Copies a verified backup into a new database file at `target`.
///
/// `target` must not exist; swapping it in place of a live database is the
/// caller's job. Returns the schema version of the restored file.
pub fn restore_backup(backup: impl AsRef<Path>, target: impl AsRef<Path>) -> DriverResult<u32> {
    let backup = backup.as_ref();
    let target = target.as_ref();
    let started_at = Instant::now();

    let conn = open_existing(backup)?;
    let version = verify_connection(&conn, backup)?;
    check_destination(target)?;

    if let Err(err) = conn.execute("VACUUM INTO ?1;", [destination_str(target)?]) {
        remove_partial(target);
        error!(
            "event=backup_restore module=driver status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(DriverError::backup_failed(target, err));
    }

    // Re-open through the normal bootstrap so the restored file runs in WAL.
    let restored = db::connect(target).map_err(|err| DriverError::backup_failed(target, err))?;
    verify_connection(&restored, target)?;

    info!(
        "event=backup_restore module=driver status=ok schema_version={} duration_ms={}",
        version,
        started_at.elapsed().as_millis()
    );
    Ok(version)
}

fn snapshot_from_file(source: &Path, ctx: &Context, target: &str) -> DriverResult<()> {
    let conn = db::connect(source).map_err(|err| DriverError::Unavailable(err.to_string()))?;
    install_interrupt(&conn, ctx);
    let result = conn.execute("VACUUM INTO ?1;", [target]);
    conn.progress_handler(0, None::<fn() -> bool>);
    result?;
    Ok(())
}

fn verify_connection(conn: &Connection, path: &Path) -> DriverResult<u32> {
    let application_id: i32 = conn.query_row("PRAGMA application_id;", [], |row| row.get(0))?;
    if application_id != APPLICATION_ID {
        return Err(DriverError::InvalidData(format!(
            "`{}` is not a memos database (application_id={application_id})",
            path.display()
        )));
    }

    let version = current_user_version(conn)?;
    if version > latest_version() {
        return Err(DriverError::SchemaMismatch {
            db_version: version,
            latest_supported: latest_version(),
        });
    }

    let integrity: String = conn.query_row("PRAGMA quick_check;", [], |row| row.get(0))?;
    if integrity != "ok" {
        return Err(DriverError::InvalidData(format!(
            "integrity check failed for `{}`: {integrity}",
            path.display()
        )));
    }

    let dangling: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_foreign_key_check;",
        [],
        |row| row.get(0),
    )?;
    if dangling > 0 {
        return Err(DriverError::InvalidData(format!(
            "`{}` has {dangling} foreign key violations",
            path.display()
        )));
    }

    Ok(version)
}

fn open_existing(path: &Path) -> DriverResult<Connection> {
    if !path.is_file() {
        return Err(DriverError::not_found("backup file", path.display()));
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(|err| DriverError::Unavailable(err.to_string()))
}

fn check_destination(destination: &Path) -> DriverResult<()> {
    if destination.exists() {
        return Err(DriverError::backup_failed(
            destination,
            "destination already exists",
        ));
    }
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(
            DriverError::backup_failed(destination, "destination directory does not exist"),
        ),
        _ => Ok(()),
    }
}

fn destination_str(destination: &Path) -> DriverResult<&str> {
    destination
        .to_str()
        .ok_or_else(|| DriverError::backup_failed(destination, "destination path is not UTF-8"))
}

fn remove_partial(destination: &Path) {
    if destination.exists() {
        if let Err(err) = fs::remove_file(destination) {
            warn!(
                "event=db_backup_cleanup module=driver status=error error={}",
                err
            );
        }
    }
}
