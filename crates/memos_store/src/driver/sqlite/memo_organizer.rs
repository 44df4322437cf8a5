use super::query::Filter;
use super::{bool_to_int, int_to_bool, query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, MemoOrganizerDriver};
use crate::model::{DeleteMemoOrganizer, FindMemoOrganizer, MemoOrganizer};
use rusqlite::{params, params_from_iter, Row};

impl MemoOrganizerDriver for SqliteDriver {
    fn upsert_memo_organizer(
        &self,
        ctx: &Context,
        upsert: &MemoOrganizer,
    ) -> DriverResult<MemoOrganizer> {
        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                "INSERT INTO memo_organizer (memo_id, user_id, pinned)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (memo_id, user_id) DO UPDATE SET pinned = excluded.pinned
                 RETURNING memo_id, user_id, pinned;",
                params![upsert.memo_id, upsert.user_id, bool_to_int(upsert.pinned)],
                parse_memo_organizer_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("upsert returned no organizer row".to_string()))
        })
    }

    fn list_memo_organizers(
        &self,
        ctx: &Context,
        find: &FindMemoOrganizer,
    ) -> DriverResult<Vec<MemoOrganizer>> {
        let mut filter = Filter::new();
        filter.eq_opt("memo_id = ?", find.memo_id);
        filter.eq_opt("user_id = ?", find.user_id);

        let sql = format!(
            "SELECT memo_id, user_id, pinned FROM memo_organizer{} ORDER BY memo_id, user_id",
            filter.where_sql()
        );
        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_memo_organizer_row,
            )
        })
    }

    fn delete_memo_organizer(
        &self,
        ctx: &Context,
        delete: &DeleteMemoOrganizer,
    ) -> DriverResult<()> {
        if delete.is_empty() {
            return Err(DriverError::InvalidArgument(
                "memo organizer delete needs at least one filter".to_string(),
            ));
        }

        let mut filter = Filter::new();
        filter.eq_opt("memo_id = ?", delete.memo_id);
        filter.eq_opt("user_id = ?", delete.user_id);

        let sql = format!("DELETE FROM memo_organizer{};", filter.where_sql());
        self.with_connection(ctx, |conn| {
            conn.execute(&sql, params_from_iter(filter.into_args()))?;
            Ok(())
        })
    }
}

fn parse_memo_organizer_row(row: &Row<'_>) -> DriverResult<MemoOrganizer> {
    Ok(MemoOrganizer {
        memo_id: row.get("memo_id")?,
        user_id: row.get("user_id")?,
        pinned: int_to_bool(row.get("pinned")?, "memo_organizer.pinned")?,
    })
}
