//! Persistence core for memos.
//! The store facade and its drivers are the only code that touches the
//! database.

pub mod context;
pub mod db;
pub mod driver;
pub mod logging;
pub mod model;
pub mod profile;
pub mod store;

pub use context::Context;
pub use driver::sqlite::{restore_backup, verify_backup};
pub use driver::{new_driver, Driver, DriverError, DriverKind, DriverResult, SqliteDriver};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use profile::{Mode, Profile, ProfileError};
pub use store::{extract_tags, MemoDetail, Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Newest schema version this build can migrate to.
pub fn schema_version() -> u32 {
    db::migrations::latest_version()
}

#[cfg(test)]
mod tests {
    use super::{core_version, schema_version};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn schema_version_counts_bundled_migrations() {
        assert_eq!(schema_version(), 3);
    }
}
