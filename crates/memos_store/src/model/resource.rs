//! Resource metadata: where an uploaded file lives, not its bytes.
//!
//! # Invariants
//! - `size` is never negative.
//! - `storage` is `Local` or names a `Storage` row that existed at creation.
//! - Deleting the attached memo clears `memo_id`; the resource survives.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend holding the resource content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum StorageRef {
    #[default]
    Local,
    Storage(i32),
}

impl StorageRef {
    pub fn storage_id(self) -> Option<i32> {
        match self {
            Self::Local => None,
            Self::Storage(id) => Some(id),
        }
    }

    pub fn from_storage_id(storage_id: Option<i32>) -> Self {
        storage_id.map_or(Self::Local, Self::Storage)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i32,
    pub uid: String,
    pub creator_id: i32,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub filename: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: i64,
    pub internal_path: String,
    pub external_link: String,
    pub storage: StorageRef,
    pub memo_id: Option<i32>,
}

impl Resource {
    pub fn new(
        creator_id: i32,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            creator_id,
            filename: filename.into(),
            mime_type: mime_type.into(),
            size,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindResource {
    pub id: Option<i32>,
    pub uid: Option<String>,
    pub creator_id: Option<i32>,
    pub filename: Option<String>,
    pub memo_id: Option<i32>,
    /// `Some(false)` selects detached resources.
    pub has_related_memo: Option<bool>,
    pub storage: Option<StorageRef>,
    pub limit: Option<u32>,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResource {
    pub id: i32,
    pub uid: Option<String>,
    pub updated_ts: Option<i64>,
    pub filename: Option<String>,
    pub internal_path: Option<String>,
    pub external_link: Option<String>,
    /// `Some(None)` detaches the resource from its memo.
    pub memo_id: Option<Option<i32>>,
}

impl UpdateResource {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none()
            && self.updated_ts.is_none()
            && self.filename.is_none()
            && self.internal_path.is_none()
            && self.external_link.is_none()
            && self.memo_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResource {
    pub id: i32,
}
