//! System settings plus the two user setting tables.
//!
//! Legacy `user_setting` rows hold raw strings; `user_setting_v1` rows hold
//! the JSON encoding of a typed value. Neither table reads the other.

use super::query::Filter;
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, SystemSettingDriver, UserSettingDriver};
use crate::model::{
    FindSystemSetting, FindUserSetting, FindUserSettingV1, SystemSetting, UserSetting,
    UserSettingKey, UserSettingV1, UserSettingValue,
};
use rusqlite::{params, params_from_iter, Row};

impl SystemSettingDriver for SqliteDriver {
    fn upsert_system_setting(
        &self,
        ctx: &Context,
        upsert: &SystemSetting,
    ) -> DriverResult<SystemSetting> {
        if upsert.name.trim().is_empty() {
            return Err(DriverError::InvalidArgument(
                "system setting name is empty".to_string(),
            ));
        }

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                "INSERT INTO system_setting (name, value, description)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (name) DO UPDATE SET
                    value = excluded.value,
                    description = excluded.description
                 RETURNING name, value, description;",
                params![
                    upsert.name.as_str(),
                    upsert.value.as_str(),
                    upsert.description.as_str()
                ],
                parse_system_setting_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("upsert returned no setting row".to_string()))
        })
    }

    fn list_system_settings(
        &self,
        ctx: &Context,
        find: &FindSystemSetting,
    ) -> DriverResult<Vec<SystemSetting>> {
        let mut filter = Filter::new();
        filter.eq_opt("name = ?", find.name.clone());

        let sql = format!(
            "SELECT name, value, description FROM system_setting{} ORDER BY name ASC",
            filter.where_sql()
        );
        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_system_setting_row,
            )
        })
    }
}

impl UserSettingDriver for SqliteDriver {
    fn upsert_user_setting(
        &self,
        ctx: &Context,
        upsert: &UserSetting,
    ) -> DriverResult<UserSetting> {
        if upsert.key.trim().is_empty() {
            return Err(DriverError::InvalidArgument(
                "user setting key is empty".to_string(),
            ));
        }

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                "INSERT INTO user_setting (user_id, key, value)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = excluded.value
                 RETURNING user_id, key, value;",
                params![upsert.user_id, upsert.key.as_str(), upsert.value.as_str()],
                parse_user_setting_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("upsert returned no setting row".to_string()))
        })
    }

    fn list_user_settings(
        &self,
        ctx: &Context,
        find: &FindUserSetting,
    ) -> DriverResult<Vec<UserSetting>> {
        let mut filter = Filter::new();
        filter.eq_opt("user_id = ?", find.user_id);
        filter.eq_opt("key = ?", find.key.clone());

        let sql = format!(
            "SELECT user_id, key, value FROM user_setting{} ORDER BY user_id ASC, key ASC",
            filter.where_sql()
        );
        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_user_setting_row,
            )
        })
    }

    fn upsert_user_setting_v1(
        &self,
        ctx: &Context,
        upsert: &UserSettingV1,
    ) -> DriverResult<UserSettingV1> {
        let value = serde_json::to_string(&upsert.value)?;

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                "INSERT INTO user_setting_v1 (user_id, key, value)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = excluded.value
                 RETURNING user_id, key, value;",
                params![upsert.user_id, upsert.key().as_str(), value],
                parse_user_setting_v1_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("upsert returned no setting row".to_string()))
        })
    }

    fn list_user_settings_v1(
        &self,
        ctx: &Context,
        find: &FindUserSettingV1,
    ) -> DriverResult<Vec<UserSettingV1>> {
        let mut filter = Filter::new();
        filter.eq_opt("user_id = ?", find.user_id);
        filter.eq_opt("key = ?", find.key.map(|k| k.as_str().to_string()));

        let sql = format!(
            "SELECT user_id, key, value FROM user_setting_v1{} ORDER BY user_id ASC, key ASC",
            filter.where_sql()
        );
        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_user_setting_v1_row,
            )
        })
    }
}

fn parse_system_setting_row(row: &Row<'_>) -> DriverResult<SystemSetting> {
    Ok(SystemSetting {
        name: row.get("name")?,
        value: row.get("value")?,
        description: row.get("description")?,
    })
}

fn parse_user_setting_row(row: &Row<'_>) -> DriverResult<UserSetting> {
    Ok(UserSetting {
        user_id: row.get("user_id")?,
        key: row.get("key")?,
        value: row.get("value")?,
    })
}

fn parse_user_setting_v1_row(row: &Row<'_>) -> DriverResult<UserSettingV1> {
    let key_text: String = row.get("key")?;
    let key = UserSettingKey::parse(&key_text).ok_or_else(|| {
        DriverError::InvalidData(format!("invalid key `{key_text}` in user_setting_v1.key"))
    })?;
    let value_text: String = row.get("value")?;
    let value: UserSettingValue = serde_json::from_str(&value_text)?;
    if value.key() != key {
        return Err(DriverError::InvalidData(format!(
            "user_setting_v1 value for `{}` stored under key `{key_text}`",
            value.key().as_str()
        )));
    }

    Ok(UserSettingV1 {
        user_id: row.get("user_id")?,
        value,
    })
}
