//! Memo records and their descriptors.
//!
//! # Invariants
//! - `pinned` is the creator's own organizer state; it is read-only here and
//!   changed through `MemoOrganizer` upserts.
//! - `parent_id` is derived from a `COMMENT` relation and is read-only here.

use super::RowStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Protected => "PROTECTED",
            Self::Private => "PRIVATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUBLIC" => Some(Self::Public),
            "PROTECTED" => Some(Self::Protected),
            "PRIVATE" => Some(Self::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: i32,
    /// Public identifier, unique.
    pub uid: String,
    pub row_status: RowStatus,
    pub creator_id: i32,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub content: String,
    pub visibility: Visibility,
    pub pinned: bool,
    pub parent_id: Option<i32>,
}

impl Memo {
    /// Builds a create request with a freshly generated `uid`.
    pub fn new(creator_id: i32, content: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            creator_id,
            content: content.into(),
            visibility,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindMemo {
    pub id: Option<i32>,
    pub uid: Option<String>,
    pub row_status: Option<RowStatus>,
    pub creator_id: Option<i32>,
    /// Inclusive lower bound on `created_ts`.
    pub created_ts_after: Option<i64>,
    /// Exclusive upper bound on `created_ts`.
    pub created_ts_before: Option<i64>,
    /// Every term must occur in the content.
    pub content_search: Vec<String>,
    /// Matches any listed visibility; empty means no restriction.
    pub visibility_list: Vec<Visibility>,
    pub pinned: Option<bool>,
    pub has_parent: Option<bool>,
    /// Returns records with an empty `content`.
    pub exclude_content: bool,
    /// Secondary order key after pinned-first; defaults to `created_ts`.
    pub order_by_updated_ts: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMemo {
    pub id: i32,
    pub uid: Option<String>,
    pub created_ts: Option<i64>,
    pub updated_ts: Option<i64>,
    pub row_status: Option<RowStatus>,
    pub content: Option<String>,
    pub visibility: Option<Visibility>,
}

impl UpdateMemo {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none()
            && self.created_ts.is_none()
            && self.updated_ts.is_none()
            && self.row_status.is_none()
            && self.content.is_none()
            && self.visibility.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteMemo {
    pub id: i32,
}
