//! System-wide and per-user settings.
//!
//! # Invariants
//! - `SystemSetting` has one row per `name`.
//! - Legacy `UserSetting` has one row per `(user_id, key)` with a string value.
//! - Typed `UserSettingV1` has one row per `(user_id, key)` in its own table;
//!   the two representations never override each other.

use super::memo::Visibility;
use serde::{Deserialize, Serialize};

/// Well-known system setting names.
pub mod names {
    pub const SERVER_ID: &str = "server-id";
    pub const SECRET_SESSION: &str = "secret-session";
    pub const ALLOW_SIGNUP: &str = "allow-signup";
    pub const DISABLE_PASSWORD_LOGIN: &str = "disable-password-login";
    pub const STORAGE_SERVICE_ID: &str = "storage-service-id";
    pub const LOCAL_STORAGE_PATH: &str = "local-storage-path";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSetting {
    pub name: String,
    pub value: String,
    pub description: String,
}

impl SystemSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindSystemSetting {
    pub name: Option<String>,
}

/// Legacy loosely-typed user setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSetting {
    pub user_id: i32,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindUserSetting {
    pub user_id: Option<i32>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserSettingKey {
    AccessTokens,
    Locale,
    Appearance,
    MemoVisibility,
}

impl UserSettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessTokens => "ACCESS_TOKENS",
            Self::Locale => "LOCALE",
            Self::Appearance => "APPEARANCE",
            Self::MemoVisibility => "MEMO_VISIBILITY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACCESS_TOKENS" => Some(Self::AccessTokens),
            "LOCALE" => Some(Self::Locale),
            "APPEARANCE" => Some(Self::Appearance),
            "MEMO_VISIBILITY" => Some(Self::MemoVisibility),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub description: String,
}

/// Typed value; the variant must agree with the row key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSettingValue {
    AccessTokens(Vec<AccessToken>),
    Locale(String),
    Appearance(String),
    MemoVisibility(Visibility),
}

impl UserSettingValue {
    pub fn key(&self) -> UserSettingKey {
        match self {
            Self::AccessTokens(_) => UserSettingKey::AccessTokens,
            Self::Locale(_) => UserSettingKey::Locale,
            Self::Appearance(_) => UserSettingKey::Appearance,
            Self::MemoVisibility(_) => UserSettingKey::MemoVisibility,
        }
    }
}

/// Typed user setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettingV1 {
    pub user_id: i32,
    pub value: UserSettingValue,
}

impl UserSettingV1 {
    pub fn key(&self) -> UserSettingKey {
        self.value.key()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindUserSettingV1 {
    pub user_id: Option<i32>,
    pub key: Option<UserSettingKey>,
}
