//! User accounts.

use super::RowStatus;
use serde::{Deserialize, Serialize};

/// Account role. Exactly one `Host` is expected per instance; that is an
/// application rule, not a storage constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Host,
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "HOST",
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HOST" => Some(Self::Host),
            "ADMIN" => Some(Self::Admin),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated on create; ignored as input.
    pub id: i32,
    pub row_status: RowStatus,
    /// Unix seconds.
    pub created_ts: i64,
    /// Unix seconds.
    pub updated_ts: i64,
    /// Unique across all rows.
    pub username: String,
    pub role: Role,
    pub email: String,
    pub nickname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: String,
}

impl User {
    /// Builds a create request for a new active account.
    pub fn new(username: impl Into<String>, role: Role, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role,
            password_hash: password_hash.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindUser {
    pub id: Option<i32>,
    pub row_status: Option<RowStatus>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUser {
    pub id: i32,
    pub updated_ts: Option<i64>,
    pub row_status: Option<RowStatus>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.updated_ts.is_none()
            && self.row_status.is_none()
            && self.username.is_none()
            && self.role.is_none()
            && self.email.is_none()
            && self.nickname.is_none()
            && self.password_hash.is_none()
            && self.avatar_url.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteUser {
    pub id: i32,
}
