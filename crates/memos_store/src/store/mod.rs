//! Store facade: the single entry point the application talks to.
//!
//! # Responsibility
//! - Own the selected driver for the life of the process.
//! - Delegate single-entity calls to the driver unchanged.
//! - Compose multi-entity workflows (memo cascade delete, tag sync, detail
//!   views) from driver calls.
//!
//! # Invariants
//! - The store never issues SQL itself; everything goes through `Driver`.
//! - Cascade steps are individually idempotent, so retrying a failed
//!   `delete_memo` is safe.

use crate::context::Context;
use crate::driver::{new_driver, Driver, DriverError};
use crate::model::{
    Activity, DeleteIdentityProvider, DeleteStorage, DeleteTag, DeleteUser, FindActivity,
    FindIdentityProvider, FindStorage, FindSystemSetting, FindTag, FindUser, FindUserSetting,
    FindUserSettingV1, IdentityProvider, Storage, SystemSetting, Tag, UpdateIdentityProvider,
    UpdateStorage, UpdateUser, User, UserSetting, UserSettingV1,
};
use crate::profile::Profile;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

mod memo;

pub use memo::{extract_tags, MemoDetail};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Single driver call failed.
    Driver(DriverError),
    /// A step of a multi-step workflow failed; earlier steps stay applied.
    Cascade {
        step: &'static str,
        source: DriverError,
    },
}

impl StoreError {
    /// Driver error behind this failure.
    pub fn driver_error(&self) -> &DriverError {
        match self {
            Self::Driver(err) | Self::Cascade { source: err, .. } => err,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Driver(err) => write!(f, "{err}"),
            Self::Cascade { step, source } => write!(f, "cascade step `{step}` failed: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Driver(err) | Self::Cascade { source: err, .. } => Some(err),
        }
    }
}

impl From<DriverError> for StoreError {
    fn from(value: DriverError) -> Self {
        Self::Driver(value)
    }
}

/// Application-facing persistence facade.
pub struct Store {
    driver: Box<dyn Driver>,
    profile: Profile,
}

impl Store {
    /// Wraps an already-opened driver. Does not migrate.
    pub fn new(driver: Box<dyn Driver>, profile: Profile) -> Self {
        Self { driver, profile }
    }

    /// Opens the backend named by `profile` and brings its schema up to date.
    pub fn open(ctx: &Context, profile: Profile) -> StoreResult<Self> {
        let driver = new_driver(&profile)?;
        driver.migrate(ctx)?;
        info!(
            "event=store_open module=store status=ok mode={} driver={}",
            profile.mode.as_str(),
            profile.driver
        );
        Ok(Self::new(driver, profile))
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Underlying driver, for calls the facade does not wrap.
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn close(&self) -> StoreResult<()> {
        Ok(self.driver.close()?)
    }

    pub fn migrate(&self, ctx: &Context) -> StoreResult<()> {
        Ok(self.driver.migrate(ctx)?)
    }

    pub fn vacuum(&self, ctx: &Context) -> StoreResult<()> {
        Ok(self.driver.vacuum(ctx)?)
    }

    pub fn backup_to(&self, ctx: &Context, destination: &Path) -> StoreResult<()> {
        Ok(self.driver.backup_to(ctx, destination)?)
    }

    // Users

    pub fn create_user(&self, ctx: &Context, create: &User) -> StoreResult<User> {
        Ok(self.driver.create_user(ctx, create)?)
    }

    pub fn list_users(&self, ctx: &Context, find: &FindUser) -> StoreResult<Vec<User>> {
        Ok(self.driver.list_users(ctx, find)?)
    }

    /// First user matching `find`, or `None`.
    pub fn get_user(&self, ctx: &Context, find: &FindUser) -> StoreResult<Option<User>> {
        let find = FindUser {
            limit: Some(1),
            ..find.clone()
        };
        Ok(self.driver.list_users(ctx, &find)?.into_iter().next())
    }

    pub fn update_user(&self, ctx: &Context, update: &UpdateUser) -> StoreResult<User> {
        Ok(self.driver.update_user(ctx, update)?)
    }

    pub fn delete_user(&self, ctx: &Context, delete: &DeleteUser) -> StoreResult<()> {
        Ok(self.driver.delete_user(ctx, delete)?)
    }

    // Activities

    pub fn create_activity(&self, ctx: &Context, create: &Activity) -> StoreResult<Activity> {
        Ok(self.driver.create_activity(ctx, create)?)
    }

    pub fn list_activities(
        &self,
        ctx: &Context,
        find: &FindActivity,
    ) -> StoreResult<Vec<Activity>> {
        Ok(self.driver.list_activities(ctx, find)?)
    }

    // Tags

    pub fn upsert_tag(&self, ctx: &Context, upsert: &Tag) -> StoreResult<Tag> {
        Ok(self.driver.upsert_tag(ctx, upsert)?)
    }

    pub fn list_tags(&self, ctx: &Context, find: &FindTag) -> StoreResult<Vec<Tag>> {
        Ok(self.driver.list_tags(ctx, find)?)
    }

    pub fn delete_tag(&self, ctx: &Context, delete: &DeleteTag) -> StoreResult<()> {
        Ok(self.driver.delete_tag(ctx, delete)?)
    }

    // Settings

    pub fn upsert_system_setting(
        &self,
        ctx: &Context,
        upsert: &SystemSetting,
    ) -> StoreResult<SystemSetting> {
        Ok(self.driver.upsert_system_setting(ctx, upsert)?)
    }

    pub fn list_system_settings(
        &self,
        ctx: &Context,
        find: &FindSystemSetting,
    ) -> StoreResult<Vec<SystemSetting>> {
        Ok(self.driver.list_system_settings(ctx, find)?)
    }

    pub fn get_system_setting(
        &self,
        ctx: &Context,
        name: &str,
    ) -> StoreResult<Option<SystemSetting>> {
        let find = FindSystemSetting {
            name: Some(name.to_string()),
        };
        Ok(self.driver.list_system_settings(ctx, &find)?.into_iter().next())
    }

    pub fn upsert_user_setting(
        &self,
        ctx: &Context,
        upsert: &UserSetting,
    ) -> StoreResult<UserSetting> {
        Ok(self.driver.upsert_user_setting(ctx, upsert)?)
    }

    pub fn list_user_settings(
        &self,
        ctx: &Context,
        find: &FindUserSetting,
    ) -> StoreResult<Vec<UserSetting>> {
        Ok(self.driver.list_user_settings(ctx, find)?)
    }

    pub fn upsert_user_setting_v1(
        &self,
        ctx: &Context,
        upsert: &UserSettingV1,
    ) -> StoreResult<UserSettingV1> {
        Ok(self.driver.upsert_user_setting_v1(ctx, upsert)?)
    }

    pub fn list_user_settings_v1(
        &self,
        ctx: &Context,
        find: &FindUserSettingV1,
    ) -> StoreResult<Vec<UserSettingV1>> {
        Ok(self.driver.list_user_settings_v1(ctx, find)?)
    }

    // Identity providers

    pub fn create_identity_provider(
        &self,
        ctx: &Context,
        create: &IdentityProvider,
    ) -> StoreResult<IdentityProvider> {
        Ok(self.driver.create_identity_provider(ctx, create)?)
    }

    pub fn list_identity_providers(
        &self,
        ctx: &Context,
        find: &FindIdentityProvider,
    ) -> StoreResult<Vec<IdentityProvider>> {
        Ok(self.driver.list_identity_providers(ctx, find)?)
    }

    pub fn get_identity_provider(
        &self,
        ctx: &Context,
        find: &FindIdentityProvider,
    ) -> StoreResult<Option<IdentityProvider>> {
        Ok(self.driver.get_identity_provider(ctx, find)?)
    }

    pub fn update_identity_provider(
        &self,
        ctx: &Context,
        update: &UpdateIdentityProvider,
    ) -> StoreResult<IdentityProvider> {
        Ok(self.driver.update_identity_provider(ctx, update)?)
    }

    pub fn delete_identity_provider(
        &self,
        ctx: &Context,
        delete: &DeleteIdentityProvider,
    ) -> StoreResult<()> {
        Ok(self.driver.delete_identity_provider(ctx, delete)?)
    }

    // Storages

    pub fn create_storage(&self, ctx: &Context, create: &Storage) -> StoreResult<Storage> {
        Ok(self.driver.create_storage(ctx, create)?)
    }

    pub fn list_storages(&self, ctx: &Context, find: &FindStorage) -> StoreResult<Vec<Storage>> {
        Ok(self.driver.list_storages(ctx, find)?)
    }

    pub fn get_storage(&self, ctx: &Context, find: &FindStorage) -> StoreResult<Option<Storage>> {
        Ok(self.driver.get_storage(ctx, find)?)
    }

    pub fn update_storage(&self, ctx: &Context, update: &UpdateStorage) -> StoreResult<Storage> {
        Ok(self.driver.update_storage(ctx, update)?)
    }

    pub fn delete_storage(&self, ctx: &Context, delete: &DeleteStorage) -> StoreResult<()> {
        Ok(self.driver.delete_storage(ctx, delete)?)
    }
}
