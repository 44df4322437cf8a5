use super::query::Filter;
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, TagDriver};
use crate::model::{DeleteTag, FindTag, Tag};
use rusqlite::{params, params_from_iter, Row};

impl TagDriver for SqliteDriver {
    fn upsert_tag(&self, ctx: &Context, upsert: &Tag) -> DriverResult<Tag> {
        if upsert.name.trim().is_empty() {
            return Err(DriverError::InvalidArgument("tag name is empty".to_string()));
        }

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                "INSERT INTO tag (name, creator_id)
                 VALUES (?1, ?2)
                 ON CONFLICT (name, creator_id) DO UPDATE SET name = excluded.name
                 RETURNING name, creator_id;",
                params![upsert.name.as_str(), upsert.creator_id],
                parse_tag_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("upsert returned no tag row".to_string()))
        })
    }

    fn list_tags(&self, ctx: &Context, find: &FindTag) -> DriverResult<Vec<Tag>> {
        let mut filter = Filter::new();
        filter.eq_opt("creator_id = ?", find.creator_id);

        let sql = format!(
            "SELECT name, creator_id FROM tag{} ORDER BY name ASC, creator_id ASC",
            filter.where_sql()
        );
        self.with_connection(ctx, |conn| {
            query_all(conn, &sql, params_from_iter(filter.into_args()), parse_tag_row)
        })
    }

    fn delete_tag(&self, ctx: &Context, delete: &DeleteTag) -> DriverResult<()> {
        self.with_connection(ctx, |conn| {
            conn.execute(
                "DELETE FROM tag WHERE name = ?1 AND creator_id = ?2;",
                params![delete.name.as_str(), delete.creator_id],
            )?;
            Ok(())
        })
    }
}

fn parse_tag_row(row: &Row<'_>) -> DriverResult<Tag> {
    Ok(Tag {
        name: row.get("name")?,
        creator_id: row.get("creator_id")?,
    })
}
