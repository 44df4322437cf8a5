//! Resolved runtime profile handed to the store by the bootstrap layer.
//!
//! # Responsibility
//! - Describe which backend to open and where its data lives.
//! - Resolve defaults from `MEMOS_*` environment variables.
//!
//! # Invariants
//! - An empty SQLite dsn resolves to `<data>/memos_<mode>.db`.

use crate::driver::DriverKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const ENV_MODE: &str = "MEMOS_MODE";
const ENV_DRIVER: &str = "MEMOS_DRIVER";
const ENV_DSN: &str = "MEMOS_DSN";
const ENV_DATA: &str = "MEMOS_DATA";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Prod,
    Dev,
    #[default]
    Demo,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
            Self::Demo => "demo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" => Some(Self::Prod),
            "dev" => Some(Self::Dev),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    InvalidMode(String),
    UnsupportedDriver(String),
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMode(value) => {
                write!(f, "unsupported mode `{value}`; expected prod|dev|demo")
            }
            Self::UnsupportedDriver(value) => write!(f, "unsupported database driver `{value}`"),
        }
    }
}

impl Error for ProfileError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub mode: Mode,
    pub driver: DriverKind,
    /// Backend data source name; for SQLite a file path or `:memory:`.
    pub dsn: String,
    /// Data directory used to derive a default dsn.
    pub data: PathBuf,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            mode: Mode::Demo,
            driver: DriverKind::Sqlite,
            dsn: String::new(),
            data: PathBuf::from("."),
        }
    }
}

impl Profile {
    /// Profile backed by a private in-memory SQLite database.
    pub fn in_memory() -> Self {
        Self {
            dsn: crate::driver::sqlite::IN_MEMORY_DSN.to_string(),
            ..Self::default()
        }
    }

    /// Reads `MEMOS_MODE`, `MEMOS_DRIVER`, `MEMOS_DSN` and `MEMOS_DATA`.
    pub fn from_env() -> Result<Self, ProfileError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a profile from an arbitrary key lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProfileError> {
        let mut profile = Self::default();

        if let Some(value) = non_empty(lookup(ENV_MODE)) {
            profile.mode = Mode::parse(&value).ok_or(ProfileError::InvalidMode(value))?;
        }
        if let Some(value) = non_empty(lookup(ENV_DRIVER)) {
            profile.driver =
                DriverKind::parse(&value).ok_or(ProfileError::UnsupportedDriver(value))?;
        }
        if let Some(value) = non_empty(lookup(ENV_DSN)) {
            profile.dsn = value;
        }
        if let Some(value) = non_empty(lookup(ENV_DATA)) {
            profile.data = PathBuf::from(value);
        }

        Ok(profile)
    }

    /// Returns the dsn the driver should open.
    pub fn resolved_dsn(&self) -> String {
        if !self.dsn.is_empty() {
            return self.dsn.clone();
        }
        match self.driver {
            DriverKind::Sqlite => self
                .data
                .join(format!("memos_{}.db", self.mode.as_str()))
                .to_string_lossy()
                .into_owned(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Mode, Profile, ProfileError};
    use crate::driver::DriverKind;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let profile = Profile::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(profile.mode, Mode::Demo);
        assert_eq!(profile.driver, DriverKind::Sqlite);
        assert_eq!(
            PathBuf::from(profile.resolved_dsn()),
            PathBuf::from(".").join("memos_demo.db")
        );
    }

    #[test]
    fn explicit_dsn_wins_over_data_dir() {
        let profile = Profile::from_lookup(lookup_from(&[
            ("MEMOS_MODE", "prod"),
            ("MEMOS_DATA", "/var/opt/memos"),
            ("MEMOS_DSN", "/tmp/custom.db"),
        ]))
        .unwrap();
        assert_eq!(profile.mode, Mode::Prod);
        assert_eq!(profile.resolved_dsn(), "/tmp/custom.db");
    }

    #[test]
    fn unknown_driver_is_rejected() {
        let err = Profile::from_lookup(lookup_from(&[("MEMOS_DRIVER", "oracle")])).unwrap_err();
        assert_eq!(err, ProfileError::UnsupportedDriver("oracle".to_string()));
    }

    #[test]
    fn profile_deserializes_with_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"mode":"dev"}"#).unwrap();
        assert_eq!(profile.mode, Mode::Dev);
        assert_eq!(profile.driver, DriverKind::Sqlite);
    }
}
