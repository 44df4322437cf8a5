//! Per-user memo annotations. Upsert-only: there is no plain insert.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoOrganizer {
    pub memo_id: i32,
    pub user_id: i32,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindMemoOrganizer {
    pub memo_id: Option<i32>,
    pub user_id: Option<i32>,
}

/// At least one field must be set; an empty delete is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteMemoOrganizer {
    pub memo_id: Option<i32>,
    pub user_id: Option<i32>,
}

impl DeleteMemoOrganizer {
    pub fn is_empty(&self) -> bool {
        self.memo_id.is_none() && self.user_id.is_none()
    }
}
