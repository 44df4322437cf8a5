//! Backend-agnostic error taxonomy for driver calls.
//!
//! # Invariants
//! - `Conflict` and `NotFound` are terminal for the call and surface unchanged.
//! - Only `Unavailable` is retryable.
//! - `SchemaMismatch` is fatal at startup.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug)]
pub enum DriverError {
    /// Unique or primary key violation.
    Conflict(String),
    /// Update or targeted lookup on a missing key.
    NotFound(String),
    /// Malformed filter/patch, empty patch, or a CHECK/foreign key rejection.
    InvalidArgument(String),
    /// Connection closed, busy, or I/O failure.
    Unavailable(String),
    /// Persisted schema version is newer than this binary understands.
    SchemaMismatch {
        db_version: u32,
        latest_supported: u32,
    },
    /// Destination unwritable or a consistent snapshot was impossible.
    BackupFailed {
        destination: PathBuf,
        reason: String,
    },
    /// The caller's context was cancelled or its deadline passed.
    Cancelled,
    /// Persisted value cannot be mapped back to a model record.
    InvalidData(String),
    /// Backend failure not covered by the variants above.
    Db(DbError),
}

impl DriverError {
    /// Whether the caller may retry the same call after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub(crate) fn not_found(entity: &str, key: impl Display) -> Self {
        Self::NotFound(format!("{entity} not found: {key}"))
    }

    pub(crate) fn backup_failed(destination: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self::BackupFailed {
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Unavailable(message) => write!(f, "backend unavailable: {message}"),
            Self::SchemaMismatch {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::BackupFailed {
                destination,
                reason,
            } => write!(f, "backup to `{}` failed: {reason}", destination.display()),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DriverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DriverError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => Self::SchemaMismatch {
                db_version,
                latest_supported,
            },
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(value: rusqlite::Error) -> Self {
        let (code, extended_code) = match &value {
            rusqlite::Error::SqliteFailure(err, _) => (err.code, err.extended_code),
            _ => return Self::Db(DbError::Sqlite(value)),
        };

        match code {
            ErrorCode::ConstraintViolation => match extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::Conflict(value.to_string()),
                _ => Self::InvalidArgument(value.to_string()),
            },
            ErrorCode::OperationInterrupted => Self::Cancelled,
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull => Self::Unavailable(value.to_string()),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(format!("json: {value}"))
    }
}
