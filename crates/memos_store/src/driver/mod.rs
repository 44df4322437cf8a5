//! Driver contract every SQL dialect backend implements.
//!
//! # Responsibility
//! - Define one narrow capability trait per entity group.
//! - Compose them into `Driver`, the single object the store dispatches to.
//! - Select a backend at runtime from the configured `DriverKind`.
//!
//! # Invariants
//! - Implementations are `Send + Sync` and need no external locking.
//! - Every mutation is atomic with respect to concurrent calls on the same row.
//! - Upserts resolve conflicts in the statement, never by read-then-write.
//! - Deletes are idempotent: a missing row is not an error.

use crate::context::Context;
use crate::model::{
    Activity, DeleteIdentityProvider, DeleteMemo, DeleteMemoOrganizer, DeleteMemoRelation,
    DeleteResource, DeleteStorage, DeleteTag, DeleteUser, FindActivity, FindIdentityProvider,
    FindMemo, FindMemoOrganizer, FindMemoRelation, FindResource, FindStorage, FindSystemSetting,
    FindTag, FindUser, FindUserSetting, FindUserSettingV1, IdentityProvider, Memo, MemoOrganizer,
    MemoRelation, Resource, Storage, SystemSetting, Tag, UpdateIdentityProvider, UpdateMemo,
    UpdateResource, UpdateStorage, UpdateUser, User, UserSetting, UserSettingV1, Visibility,
};
use crate::profile::Profile;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::Path;

mod error;
pub mod sqlite;

pub use error::{DriverError, DriverResult};
pub use sqlite::SqliteDriver;

/// Supported backend dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Sqlite,
}

impl DriverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl Display for DriverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle and maintenance operations.
pub trait MaintenanceDriver {
    fn kind(&self) -> DriverKind;
    /// Releases the physical connection. Idempotent.
    fn close(&self) -> DriverResult<()>;
    /// Applies pending schema migrations; a no-op on an up-to-date schema.
    fn migrate(&self, ctx: &Context) -> DriverResult<()>;
    /// Removes orphaned rows and reclaims storage space.
    fn vacuum(&self, ctx: &Context) -> DriverResult<()>;
    /// Writes a consistent snapshot to a new file at `destination`.
    fn backup_to(&self, ctx: &Context, destination: &Path) -> DriverResult<()>;
}

pub trait ActivityDriver {
    fn create_activity(&self, ctx: &Context, create: &Activity) -> DriverResult<Activity>;
    fn list_activities(&self, ctx: &Context, find: &FindActivity) -> DriverResult<Vec<Activity>>;
}

pub trait ResourceDriver {
    fn create_resource(&self, ctx: &Context, create: &Resource) -> DriverResult<Resource>;
    fn list_resources(&self, ctx: &Context, find: &FindResource) -> DriverResult<Vec<Resource>>;
    fn update_resource(&self, ctx: &Context, update: &UpdateResource) -> DriverResult<Resource>;
    fn delete_resource(&self, ctx: &Context, delete: &DeleteResource) -> DriverResult<()>;
}

pub trait MemoDriver {
    fn create_memo(&self, ctx: &Context, create: &Memo) -> DriverResult<Memo>;
    /// Lists memos pinned first, then newest first.
    fn list_memos(&self, ctx: &Context, find: &FindMemo) -> DriverResult<Vec<Memo>>;
    fn update_memo(&self, ctx: &Context, update: &UpdateMemo) -> DriverResult<Memo>;
    /// Deletes the memo with its relations and organizer rows; attached
    /// resources are detached.
    fn delete_memo(&self, ctx: &Context, delete: &DeleteMemo) -> DriverResult<()>;
    /// Maps each existing id to its visibility; unknown ids are omitted.
    fn find_memos_visibility_list(
        &self,
        ctx: &Context,
        memo_ids: &[i32],
    ) -> DriverResult<BTreeMap<i32, Visibility>>;
}

pub trait MemoRelationDriver {
    fn upsert_memo_relation(&self, ctx: &Context, upsert: &MemoRelation)
        -> DriverResult<MemoRelation>;
    fn list_memo_relations(
        &self,
        ctx: &Context,
        find: &FindMemoRelation,
    ) -> DriverResult<Vec<MemoRelation>>;
    fn delete_memo_relation(&self, ctx: &Context, delete: &DeleteMemoRelation)
        -> DriverResult<()>;
}

pub trait MemoOrganizerDriver {
    fn upsert_memo_organizer(
        &self,
        ctx: &Context,
        upsert: &MemoOrganizer,
    ) -> DriverResult<MemoOrganizer>;
    fn list_memo_organizers(
        &self,
        ctx: &Context,
        find: &FindMemoOrganizer,
    ) -> DriverResult<Vec<MemoOrganizer>>;
    fn delete_memo_organizer(
        &self,
        ctx: &Context,
        delete: &DeleteMemoOrganizer,
    ) -> DriverResult<()>;
}

pub trait SystemSettingDriver {
    fn upsert_system_setting(
        &self,
        ctx: &Context,
        upsert: &SystemSetting,
    ) -> DriverResult<SystemSetting>;
    fn list_system_settings(
        &self,
        ctx: &Context,
        find: &FindSystemSetting,
    ) -> DriverResult<Vec<SystemSetting>>;
}

pub trait UserDriver {
    fn create_user(&self, ctx: &Context, create: &User) -> DriverResult<User>;
    fn update_user(&self, ctx: &Context, update: &UpdateUser) -> DriverResult<User>;
    fn list_users(&self, ctx: &Context, find: &FindUser) -> DriverResult<Vec<User>>;
    /// Deletes the user with the memos, resources, tags and settings they own.
    fn delete_user(&self, ctx: &Context, delete: &DeleteUser) -> DriverResult<()>;
}

pub trait UserSettingDriver {
    fn upsert_user_setting(&self, ctx: &Context, upsert: &UserSetting)
        -> DriverResult<UserSetting>;
    fn list_user_settings(
        &self,
        ctx: &Context,
        find: &FindUserSetting,
    ) -> DriverResult<Vec<UserSetting>>;
    fn upsert_user_setting_v1(
        &self,
        ctx: &Context,
        upsert: &UserSettingV1,
    ) -> DriverResult<UserSettingV1>;
    fn list_user_settings_v1(
        &self,
        ctx: &Context,
        find: &FindUserSettingV1,
    ) -> DriverResult<Vec<UserSettingV1>>;
}

pub trait IdentityProviderDriver {
    fn create_identity_provider(
        &self,
        ctx: &Context,
        create: &IdentityProvider,
    ) -> DriverResult<IdentityProvider>;
    fn list_identity_providers(
        &self,
        ctx: &Context,
        find: &FindIdentityProvider,
    ) -> DriverResult<Vec<IdentityProvider>>;
    fn get_identity_provider(
        &self,
        ctx: &Context,
        find: &FindIdentityProvider,
    ) -> DriverResult<Option<IdentityProvider>>;
    fn update_identity_provider(
        &self,
        ctx: &Context,
        update: &UpdateIdentityProvider,
    ) -> DriverResult<IdentityProvider>;
    fn delete_identity_provider(
        &self,
        ctx: &Context,
        delete: &DeleteIdentityProvider,
    ) -> DriverResult<()>;
}

pub trait TagDriver {
    fn upsert_tag(&self, ctx: &Context, upsert: &Tag) -> DriverResult<Tag>;
    fn list_tags(&self, ctx: &Context, find: &FindTag) -> DriverResult<Vec<Tag>>;
    fn delete_tag(&self, ctx: &Context, delete: &DeleteTag) -> DriverResult<()>;
}

pub trait StorageDriver {
    fn create_storage(&self, ctx: &Context, create: &Storage) -> DriverResult<Storage>;
    fn list_storages(&self, ctx: &Context, find: &FindStorage) -> DriverResult<Vec<Storage>>;
    fn get_storage(&self, ctx: &Context, find: &FindStorage) -> DriverResult<Option<Storage>>;
    fn update_storage(&self, ctx: &Context, update: &UpdateStorage) -> DriverResult<Storage>;
    fn delete_storage(&self, ctx: &Context, delete: &DeleteStorage) -> DriverResult<()>;
}

/// Full persistence contract, implemented by every backend.
pub trait Driver:
    MaintenanceDriver
    + ActivityDriver
    + ResourceDriver
    + MemoDriver
    + MemoRelationDriver
    + MemoOrganizerDriver
    + SystemSettingDriver
    + UserDriver
    + UserSettingDriver
    + IdentityProviderDriver
    + TagDriver
    + StorageDriver
    + Send
    + Sync
{
}

impl<T> Driver for T where
    T: MaintenanceDriver
        + ActivityDriver
        + ResourceDriver
        + MemoDriver
        + MemoRelationDriver
        + MemoOrganizerDriver
        + SystemSettingDriver
        + UserDriver
        + UserSettingDriver
        + IdentityProviderDriver
        + TagDriver
        + StorageDriver
        + Send
        + Sync
{
}

/// Opens the backend selected by `profile.driver`.
///
/// The returned driver is connected but not migrated.
pub fn new_driver(profile: &Profile) -> DriverResult<Box<dyn Driver>> {
    info!(
        "event=driver_new module=driver status=start kind={}",
        profile.driver
    );
    let driver: Box<dyn Driver> = match profile.driver {
        DriverKind::Sqlite => {
            let dsn = profile.resolved_dsn();
            if dsn == sqlite::IN_MEMORY_DSN {
                Box::new(SqliteDriver::open_in_memory()?)
            } else {
                Box::new(SqliteDriver::open(dsn)?)
            }
        }
    };
    Ok(driver)
}
