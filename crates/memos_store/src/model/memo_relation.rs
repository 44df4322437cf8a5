//! Directed, typed edges between memos.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoRelationType {
    Reference,
    /// `memo_id` is the comment, `related_memo_id` the memo commented on.
    Comment,
}

impl MemoRelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "REFERENCE",
            Self::Comment => "COMMENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "REFERENCE" => Some(Self::Reference),
            "COMMENT" => Some(Self::Comment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoRelation {
    pub memo_id: i32,
    pub related_memo_id: i32,
    #[serde(rename = "type")]
    pub kind: MemoRelationType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindMemoRelation {
    pub memo_id: Option<i32>,
    pub related_memo_id: Option<i32>,
    pub kind: Option<MemoRelationType>,
}

/// At least one field must be set; an empty delete is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteMemoRelation {
    pub memo_id: Option<i32>,
    pub related_memo_id: Option<i32>,
    pub kind: Option<MemoRelationType>,
}

impl DeleteMemoRelation {
    pub fn is_empty(&self) -> bool {
        self.memo_id.is_none() && self.related_memo_id.is_none() && self.kind.is_none()
    }
}
