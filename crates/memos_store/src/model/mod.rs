//! Entity records and their filter/patch descriptors.
//!
//! # Responsibility
//! - Define the plain data shapes persisted by every driver.
//! - Define per-entity `Find*` filters, `Update*` patches and `Delete*` keys.
//!
//! # Invariants
//! - Filter fields are optional and conjunctive; an empty filter matches all.
//! - Patch fields use `Option<T>` for presence. Nullable columns use
//!   `Option<Option<T>>` so `Some(None)` clears the column and `None` leaves it.

use serde::{Deserialize, Serialize};

pub mod activity;
pub mod idp;
pub mod memo;
pub mod memo_organizer;
pub mod memo_relation;
pub mod resource;
pub mod setting;
pub mod storage;
pub mod tag;
pub mod user;

pub use activity::{Activity, ActivityLevel, FindActivity};
pub use idp::{
    DeleteIdentityProvider, FieldMapping, FindIdentityProvider, IdentityProvider,
    IdentityProviderConfig, IdentityProviderType, UpdateIdentityProvider,
};
pub use memo::{DeleteMemo, FindMemo, Memo, UpdateMemo, Visibility};
pub use memo_organizer::{DeleteMemoOrganizer, FindMemoOrganizer, MemoOrganizer};
pub use memo_relation::{DeleteMemoRelation, FindMemoRelation, MemoRelation, MemoRelationType};
pub use resource::{DeleteResource, FindResource, Resource, StorageRef, UpdateResource};
pub use setting::{
    AccessToken, FindSystemSetting, FindUserSetting, FindUserSettingV1, SystemSetting,
    UserSetting, UserSettingKey, UserSettingV1, UserSettingValue,
};
pub use storage::{
    DeleteStorage, FindStorage, Storage, StorageConfig, StorageType, UpdateStorage,
};
pub use tag::{DeleteTag, FindTag, Tag};
pub use user::{DeleteUser, FindUser, Role, UpdateUser, User};

/// Soft-delete lifecycle flag, distinct from physical deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    #[default]
    Normal,
    Archived,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NORMAL" => Some(Self::Normal),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}
