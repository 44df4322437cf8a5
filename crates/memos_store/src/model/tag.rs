//! Per-user tags extracted from memo content.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub creator_id: i32,
}

impl Tag {
    pub fn new(name: impl Into<String>, creator_id: i32) -> Self {
        Self {
            name: name.into(),
            creator_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindTag {
    pub creator_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTag {
    pub name: String,
    pub creator_id: i32,
}
