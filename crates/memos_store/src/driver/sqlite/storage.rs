use super::query::{Filter, Patch};
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, StorageDriver};
use crate::model::{DeleteStorage, FindStorage, Storage, StorageConfig, StorageType, UpdateStorage};
use rusqlite::{params, params_from_iter, Row};

const STORAGE_COLUMNS: &str = "id, name, type, config";

impl StorageDriver for SqliteDriver {
    fn create_storage(&self, ctx: &Context, create: &Storage) -> DriverResult<Storage> {
        let config = serde_json::to_string(&create.config)?;
        let sql = format!(
            "INSERT INTO storage (name, type, config)
             VALUES (?1, ?2, ?3)
             RETURNING {STORAGE_COLUMNS};"
        );

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                &sql,
                params![create.name.as_str(), create.storage_type().as_str(), config],
                parse_storage_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("insert returned no storage row".to_string()))
        })
    }

    fn list_storages(&self, ctx: &Context, find: &FindStorage) -> DriverResult<Vec<Storage>> {
        list_storages(self, ctx, find, None)
    }

    fn get_storage(&self, ctx: &Context, find: &FindStorage) -> DriverResult<Option<Storage>> {
        Ok(list_storages(self, ctx, find, Some(1))?.into_iter().next())
    }

    fn update_storage(&self, ctx: &Context, update: &UpdateStorage) -> DriverResult<Storage> {
        if update.is_empty() {
            return Err(DriverError::InvalidArgument(
                "storage update has no fields set".to_string(),
            ));
        }

        let mut patch = Patch::new();
        patch.set("name = ?", update.name.clone());
        if let Some(config) = &update.config {
            patch.set("type = ?", Some(config.storage_type().as_str().to_string()));
            patch.set("config = ?", Some(serde_json::to_string(config)?));
        }

        let sql = format!(
            "UPDATE storage{} WHERE id = ? RETURNING {STORAGE_COLUMNS};",
            patch.set_sql()
        );
        let args = patch.into_args(update.id);

        self.with_connection(ctx, |conn| {
            query_one(conn, &sql, params_from_iter(args), parse_storage_row)?
                .ok_or_else(|| DriverError::not_found("storage", update.id))
        })
    }

    fn delete_storage(&self, ctx: &Context, delete: &DeleteStorage) -> DriverResult<()> {
        // Resources keep their soft reference; the id simply stops resolving.
        self.with_connection(ctx, |conn| {
            conn.execute("DELETE FROM storage WHERE id = ?1;", [delete.id])?;
            Ok(())
        })
    }
}

fn list_storages(
    driver: &SqliteDriver,
    ctx: &Context,
    find: &FindStorage,
    limit: Option<u32>,
) -> DriverResult<Vec<Storage>> {
    let mut filter = Filter::new();
    filter.eq_opt("id = ?", find.id);

    let mut sql = format!(
        "SELECT {STORAGE_COLUMNS} FROM storage{} ORDER BY id ASC",
        filter.where_sql()
    );
    filter.limit_offset(&mut sql, limit, 0);

    driver.with_connection(ctx, |conn| {
        query_all(
            conn,
            &sql,
            params_from_iter(filter.into_args()),
            parse_storage_row,
        )
    })
}

fn parse_storage_row(row: &Row<'_>) -> DriverResult<Storage> {
    let kind_text: String = row.get("type")?;
    let kind = StorageType::parse(&kind_text).ok_or_else(|| {
        DriverError::InvalidData(format!("invalid storage type `{kind_text}` in storage.type"))
    })?;
    let config_text: String = row.get("config")?;
    let config: StorageConfig = serde_json::from_str(&config_text)?;
    if config.storage_type() != kind {
        return Err(DriverError::InvalidData(format!(
            "storage config is {} but row type is {kind_text}",
            config.storage_type().as_str()
        )));
    }

    Ok(Storage {
        id: row.get("id")?,
        name: row.get("name")?,
        config,
    })
}
