use super::query::Filter;
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, MemoRelationDriver};
use crate::model::{DeleteMemoRelation, FindMemoRelation, MemoRelation, MemoRelationType};
use rusqlite::{params, params_from_iter, Row};

impl MemoRelationDriver for SqliteDriver {
    fn upsert_memo_relation(
        &self,
        ctx: &Context,
        upsert: &MemoRelation,
    ) -> DriverResult<MemoRelation> {
        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                "INSERT INTO memo_relation (memo_id, related_memo_id, type)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (memo_id, related_memo_id, type) DO UPDATE SET type = excluded.type
                 RETURNING memo_id, related_memo_id, type;",
                params![upsert.memo_id, upsert.related_memo_id, upsert.kind.as_str()],
                parse_memo_relation_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("upsert returned no relation row".to_string()))
        })
    }

    fn list_memo_relations(
        &self,
        ctx: &Context,
        find: &FindMemoRelation,
    ) -> DriverResult<Vec<MemoRelation>> {
        let mut filter = Filter::new();
        filter.eq_opt("memo_id = ?", find.memo_id);
        filter.eq_opt("related_memo_id = ?", find.related_memo_id);
        filter.eq_opt("type = ?", find.kind.map(|k| k.as_str().to_string()));

        let sql = format!(
            "SELECT memo_id, related_memo_id, type FROM memo_relation{} \
             ORDER BY memo_id, related_memo_id, type",
            filter.where_sql()
        );
        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_memo_relation_row,
            )
        })
    }

    fn delete_memo_relation(
        &self,
        ctx: &Context,
        delete: &DeleteMemoRelation,
    ) -> DriverResult<()> {
        // An unfiltered delete would drop the whole relation graph.
        if delete.is_empty() {
            return Err(DriverError::InvalidArgument(
                "memo relation delete needs at least one filter".to_string(),
            ));
        }

        let mut filter = Filter::new();
        filter.eq_opt("memo_id = ?", delete.memo_id);
        filter.eq_opt("related_memo_id = ?", delete.related_memo_id);
        filter.eq_opt("type = ?", delete.kind.map(|k| k.as_str().to_string()));

        let sql = format!("DELETE FROM memo_relation{};", filter.where_sql());
        self.with_connection(ctx, |conn| {
            conn.execute(&sql, params_from_iter(filter.into_args()))?;
            Ok(())
        })
    }
}

fn parse_memo_relation_row(row: &Row<'_>) -> DriverResult<MemoRelation> {
    let kind_text: String = row.get("type")?;
    let kind = MemoRelationType::parse(&kind_text).ok_or_else(|| {
        DriverError::InvalidData(format!("invalid relation type `{kind_text}` in memo_relation.type"))
    })?;

    Ok(MemoRelation {
        memo_id: row.get("memo_id")?,
        related_memo_id: row.get("related_memo_id")?,
        kind,
    })
}
