use super::query::{Filter, Patch};
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, ResourceDriver};
use crate::model::{DeleteResource, FindResource, Resource, StorageRef, UpdateResource};
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

const RESOURCE_COLUMNS: &str = "id, uid, creator_id, created_ts, updated_ts, filename, type, \
                                size, internal_path, external_link, memo_id, storage_id";

impl ResourceDriver for SqliteDriver {
    fn create_resource(&self, ctx: &Context, create: &Resource) -> DriverResult<Resource> {
        if create.size < 0 {
            return Err(DriverError::InvalidArgument(format!(
                "resource size must be non-negative, got {}",
                create.size
            )));
        }
        let uid = if create.uid.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            create.uid.clone()
        };
        let storage_id = create.storage.storage_id();

        // The SELECT yields no row when the referenced storage is missing.
        let sql = format!(
            "INSERT INTO resource
                (uid, creator_id, filename, type, size, internal_path, external_link, memo_id, storage_id)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
             WHERE ?9 IS NULL OR EXISTS (SELECT 1 FROM storage WHERE id = ?9)
             RETURNING {RESOURCE_COLUMNS};"
        );

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                &sql,
                params![
                    uid,
                    create.creator_id,
                    create.filename.as_str(),
                    create.mime_type.as_str(),
                    create.size,
                    create.internal_path.as_str(),
                    create.external_link.as_str(),
                    create.memo_id,
                    storage_id,
                ],
                parse_resource_row,
            )?
            .ok_or_else(|| {
                DriverError::InvalidArgument(format!(
                    "storage {} does not exist",
                    storage_id.unwrap_or_default()
                ))
            })
        })
    }

    fn list_resources(&self, ctx: &Context, find: &FindResource) -> DriverResult<Vec<Resource>> {
        let mut filter = Filter::new();
        filter.eq_opt("id = ?", find.id);
        filter.eq_opt("uid = ?", find.uid.clone());
        filter.eq_opt("creator_id = ?", find.creator_id);
        filter.eq_opt("filename = ?", find.filename.clone());
        filter.eq_opt("memo_id = ?", find.memo_id);
        match find.has_related_memo {
            Some(true) => filter.raw("memo_id IS NOT NULL"),
            Some(false) => filter.raw("memo_id IS NULL"),
            None => {}
        }
        match find.storage {
            Some(StorageRef::Local) => filter.raw("storage_id IS NULL"),
            Some(StorageRef::Storage(id)) => filter.eq("storage_id = ?", id),
            None => {}
        }

        let mut sql = format!(
            "SELECT {RESOURCE_COLUMNS} FROM resource{} ORDER BY created_ts DESC, id DESC",
            filter.where_sql()
        );
        filter.limit_offset(&mut sql, find.limit, find.offset);

        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_resource_row,
            )
        })
    }

    fn update_resource(&self, ctx: &Context, update: &UpdateResource) -> DriverResult<Resource> {
        if update.is_empty() {
            return Err(DriverError::InvalidArgument(
                "resource update has no fields set".to_string(),
            ));
        }

        let mut patch = Patch::new();
        patch.set("uid = ?", update.uid.clone());
        patch.set("filename = ?", update.filename.clone());
        patch.set("internal_path = ?", update.internal_path.clone());
        patch.set("external_link = ?", update.external_link.clone());
        match update.memo_id {
            Some(Some(memo_id)) => patch.set("memo_id = ?", Some(memo_id)),
            Some(None) => patch.raw("memo_id = NULL"),
            None => {}
        }
        match update.updated_ts {
            Some(ts) => patch.set("updated_ts = ?", Some(ts)),
            None => patch.raw("updated_ts = CAST(strftime('%s', 'now') AS INTEGER)"),
        }

        let sql = format!(
            "UPDATE resource{} WHERE id = ? RETURNING {RESOURCE_COLUMNS};",
            patch.set_sql()
        );
        let args = patch.into_args(update.id);

        self.with_connection(ctx, |conn| {
            query_one(conn, &sql, params_from_iter(args), parse_resource_row)?
                .ok_or_else(|| DriverError::not_found("resource", update.id))
        })
    }

    fn delete_resource(&self, ctx: &Context, delete: &DeleteResource) -> DriverResult<()> {
        self.with_connection(ctx, |conn| {
            conn.execute("DELETE FROM resource WHERE id = ?1;", [delete.id])?;
            Ok(())
        })
    }
}

fn parse_resource_row(row: &Row<'_>) -> DriverResult<Resource> {
    Ok(Resource {
        id: row.get("id")?,
        uid: row.get("uid")?,
        creator_id: row.get("creator_id")?,
        created_ts: row.get("created_ts")?,
        updated_ts: row.get("updated_ts")?,
        filename: row.get("filename")?,
        mime_type: row.get("type")?,
        size: row.get("size")?,
        internal_path: row.get("internal_path")?,
        external_link: row.get("external_link")?,
        storage: StorageRef::from_storage_id(row.get("storage_id")?),
        memo_id: row.get("memo_id")?,
    })
}
