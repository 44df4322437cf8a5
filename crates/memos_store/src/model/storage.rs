//! Configured storage backends referenced by resources.
//!
//! Only connection metadata is persisted; talking to the backend is out of
//! this crate's reach.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    Local,
    S3,
    Webdav,
}

impl StorageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::S3 => "S3",
            Self::Webdav => "WEBDAV",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOCAL" => Some(Self::Local),
            "S3" => Some(Self::S3),
            "WEBDAV" => Some(Self::Webdav),
            _ => None,
        }
    }
}

/// Backend settings. The variant determines the row `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageConfig {
    Local {
        /// Path template, e.g. `assets/{timestamp}_{filename}`.
        path: String,
    },
    S3 {
        end_point: String,
        region: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        path: String,
        url_prefix: String,
        url_suffix: String,
    },
    Webdav {
        url: String,
        path: String,
        username: String,
        password: String,
    },
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::Local { .. } => StorageType::Local,
            Self::S3 { .. } => StorageType::S3,
            Self::Webdav { .. } => StorageType::Webdav,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub id: i32,
    pub name: String,
    pub config: StorageConfig,
}

impl Storage {
    pub fn new(name: impl Into<String>, config: StorageConfig) -> Self {
        Self {
            id: 0,
            name: name.into(),
            config,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        self.config.storage_type()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindStorage {
    pub id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateStorage {
    pub id: i32,
    pub name: Option<String>,
    /// May switch the backend type along with its settings.
    pub config: Option<StorageConfig>,
}

impl UpdateStorage {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.config.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteStorage {
    pub id: i32,
}
