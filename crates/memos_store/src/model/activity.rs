//! Audit trail entries. Append-only: no update or delete exists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i32,
    pub creator_id: i32,
    pub created_ts: i64,
    /// Free-form event name, e.g. `memo.comment`.
    #[serde(rename = "type")]
    pub kind: String,
    pub level: ActivityLevel,
    /// Opaque structured payload, stored as JSON text.
    pub payload: serde_json::Value,
}

impl Activity {
    pub fn new(creator_id: i32, kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: 0,
            creator_id,
            created_ts: 0,
            kind: kind.into(),
            level: ActivityLevel::Info,
            payload,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindActivity {
    pub id: Option<i32>,
    pub creator_id: Option<i32>,
    pub kind: Option<String>,
    pub level: Option<ActivityLevel>,
    pub limit: Option<u32>,
}
