//! Memo statements.
//!
//! # Invariants
//! - `pinned` is read from the creator's own `memo_organizer` row.
//! - `parent_id` is the target of the memo's `COMMENT` relation, if any.
//! - Listing is pinned-first, then newest first.

use super::query::{Filter, Patch};
use super::{bool_to_int, int_to_bool, parse_row_status, query_all, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, MemoDriver};
use crate::model::{DeleteMemo, FindMemo, Memo, UpdateMemo, Visibility};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Upper bound on ids bound into one `IN (...)` list.
const VISIBILITY_BATCH_SIZE: usize = 500;

const MEMO_SELECT_HEAD: &str = "SELECT
    memo.id AS id,
    memo.uid AS uid,
    memo.creator_id AS creator_id,
    memo.created_ts AS created_ts,
    memo.updated_ts AS updated_ts,
    memo.row_status AS row_status,
    memo.visibility AS visibility,
    COALESCE(memo_organizer.pinned, 0) AS pinned,
    (
        SELECT memo_relation.related_memo_id
        FROM memo_relation
        WHERE memo_relation.memo_id = memo.id
          AND memo_relation.type = 'COMMENT'
        LIMIT 1
    ) AS parent_id,";

const MEMO_SELECT_FROM: &str = "
FROM memo
LEFT JOIN memo_organizer
    ON memo_organizer.memo_id = memo.id
   AND memo_organizer.user_id = memo.creator_id";

const HAS_PARENT_SQL: &str = "EXISTS (
    SELECT 1 FROM memo_relation
    WHERE memo_relation.memo_id = memo.id AND memo_relation.type = 'COMMENT'
)";

const HAS_NO_PARENT_SQL: &str = "NOT EXISTS (
    SELECT 1 FROM memo_relation
    WHERE memo_relation.memo_id = memo.id AND memo_relation.type = 'COMMENT'
)";

impl MemoDriver for SqliteDriver {
    fn create_memo(&self, ctx: &Context, create: &Memo) -> DriverResult<Memo> {
        let uid = if create.uid.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            create.uid.clone()
        };
        let created_ts = (create.created_ts > 0).then_some(create.created_ts);

        self.with_connection(ctx, |conn| {
            let id: i32 = conn.query_row(
                "INSERT INTO memo (uid, creator_id, content, visibility, row_status, created_ts, updated_ts)
                 VALUES (
                    ?1, ?2, ?3, ?4, ?5,
                    COALESCE(?6, CAST(strftime('%s', 'now') AS INTEGER)),
                    COALESCE(?6, CAST(strftime('%s', 'now') AS INTEGER))
                 )
                 RETURNING id;",
                params![
                    uid,
                    create.creator_id,
                    create.content.as_str(),
                    create.visibility.as_str(),
                    create.row_status.as_str(),
                    created_ts,
                ],
                |row| row.get(0),
            )?;
            select_memo(conn, id)?
                .ok_or_else(|| DriverError::InvalidData(format!("memo {id} missing after insert")))
        })
    }

    fn list_memos(&self, ctx: &Context, find: &FindMemo) -> DriverResult<Vec<Memo>> {
        let (sql, args) = build_list_sql(find);
        self.with_connection(ctx, |conn| {
            query_all(conn, &sql, params_from_iter(args), parse_memo_row)
        })
    }

    fn update_memo(&self, ctx: &Context, update: &UpdateMemo) -> DriverResult<Memo> {
        if update.is_empty() {
            return Err(DriverError::InvalidArgument(
                "memo update has no fields set".to_string(),
            ));
        }

        let mut patch = Patch::new();
        patch.set("uid = ?", update.uid.clone());
        patch.set("created_ts = ?", update.created_ts);
        patch.set("row_status = ?", update.row_status.map(|s| s.as_str().to_string()));
        patch.set("content = ?", update.content.clone());
        patch.set("visibility = ?", update.visibility.map(|v| v.as_str().to_string()));
        match update.updated_ts {
            Some(ts) => patch.set("updated_ts = ?", Some(ts)),
            None => patch.raw("updated_ts = CAST(strftime('%s', 'now') AS INTEGER)"),
        }

        let sql = format!("UPDATE memo{} WHERE id = ?;", patch.set_sql());
        let args = patch.into_args(update.id);

        self.with_connection(ctx, |conn| {
            let changed = conn.execute(&sql, params_from_iter(args))?;
            if changed == 0 {
                return Err(DriverError::not_found("memo", update.id));
            }
            select_memo(conn, update.id)?.ok_or_else(|| DriverError::not_found("memo", update.id))
        })
    }

    fn delete_memo(&self, ctx: &Context, delete: &DeleteMemo) -> DriverResult<()> {
        self.with_connection(ctx, |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM memo_relation WHERE memo_id = ?1 OR related_memo_id = ?1;",
                [delete.id],
            )?;
            tx.execute("DELETE FROM memo_organizer WHERE memo_id = ?1;", [delete.id])?;
            tx.execute(
                "UPDATE resource
                 SET memo_id = NULL, updated_ts = CAST(strftime('%s', 'now') AS INTEGER)
                 WHERE memo_id = ?1;",
                [delete.id],
            )?;
            tx.execute("DELETE FROM memo WHERE id = ?1;", [delete.id])?;
            tx.commit()?;
            Ok(())
        })
    }

    fn find_memos_visibility_list(
        &self,
        ctx: &Context,
        memo_ids: &[i32],
    ) -> DriverResult<BTreeMap<i32, Visibility>> {
        let mut visibilities = BTreeMap::new();
        if memo_ids.is_empty() {
            return Ok(visibilities);
        }

        self.with_connection(ctx, |conn| {
            for chunk in memo_ids.chunks(VISIBILITY_BATCH_SIZE) {
                let mut filter = Filter::new();
                filter.any_of("id", chunk.iter().map(|id| Value::from(*id)).collect());
                let sql = format!("SELECT id, visibility FROM memo{};", filter.where_sql());
                let rows = query_all(conn, &sql, params_from_iter(filter.into_args()), |row| {
                    let id: i32 = row.get("id")?;
                    let visibility = parse_visibility(&row.get::<_, String>("visibility")?)?;
                    Ok((id, visibility))
                })?;
                visibilities.extend(rows);
            }
            Ok(visibilities)
        })
    }
}

fn select_memo(conn: &Connection, id: i32) -> DriverResult<Option<Memo>> {
    let find = FindMemo {
        id: Some(id),
        ..FindMemo::default()
    };
    let (sql, args) = build_list_sql(&find);
    let mut memos = query_all(conn, &sql, params_from_iter(args), parse_memo_row)?;
    Ok(memos.pop())
}

fn build_list_sql(find: &FindMemo) -> (String, Vec<Value>) {
    let mut filter = Filter::new();
    filter.eq_opt("memo.id = ?", find.id);
    filter.eq_opt("memo.uid = ?", find.uid.clone());
    filter.eq_opt("memo.row_status = ?", find.row_status.map(|s| s.as_str().to_string()));
    filter.eq_opt("memo.creator_id = ?", find.creator_id);
    filter.eq_opt("memo.created_ts >= ?", find.created_ts_after);
    filter.eq_opt("memo.created_ts < ?", find.created_ts_before);
    for term in &find.content_search {
        filter.eq(
            "memo.content LIKE ? ESCAPE '\\'",
            format!("%{}%", escape_like(term)),
        );
    }
    if !find.visibility_list.is_empty() {
        filter.any_of(
            "memo.visibility",
            find.visibility_list
                .iter()
                .map(|v| Value::Text(v.as_str().to_string()))
                .collect(),
        );
    }
    filter.eq_opt(
        "COALESCE(memo_organizer.pinned, 0) = ?",
        find.pinned.map(bool_to_int),
    );
    match find.has_parent {
        Some(true) => filter.raw(HAS_PARENT_SQL),
        Some(false) => filter.raw(HAS_NO_PARENT_SQL),
        None => {}
    }

    let content_column = if find.exclude_content {
        " '' AS content"
    } else {
        " memo.content AS content"
    };
    let order = if find.order_by_updated_ts {
        " ORDER BY pinned DESC, memo.updated_ts DESC, memo.id DESC"
    } else {
        " ORDER BY pinned DESC, memo.created_ts DESC, memo.id DESC"
    };

    let mut sql = format!(
        "{MEMO_SELECT_HEAD}{content_column}{MEMO_SELECT_FROM}{}{order}",
        filter.where_sql()
    );
    filter.limit_offset(&mut sql, find.limit, find.offset);
    (sql, filter.into_args())
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_visibility(value: &str) -> DriverResult<Visibility> {
    Visibility::parse(value).ok_or_else(|| {
        DriverError::InvalidData(format!("invalid visibility `{value}` in memo.visibility"))
    })
}

fn parse_memo_row(row: &Row<'_>) -> DriverResult<Memo> {
    let status_text: String = row.get("row_status")?;
    let visibility_text: String = row.get("visibility")?;

    Ok(Memo {
        id: row.get("id")?,
        uid: row.get("uid")?,
        row_status: parse_row_status(&status_text, "memo.row_status")?,
        creator_id: row.get("creator_id")?,
        created_ts: row.get("created_ts")?,
        updated_ts: row.get("updated_ts")?,
        content: row.get("content")?,
        visibility: parse_visibility(&visibility_text)?,
        pinned: int_to_bool(row.get("pinned")?, "memo_organizer.pinned")?,
        parent_id: row.get("parent_id")?,
    })
}
