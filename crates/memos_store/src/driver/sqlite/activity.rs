use super::query::Filter;
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{ActivityDriver, DriverError, DriverResult};
use crate::model::{Activity, ActivityLevel, FindActivity};
use rusqlite::{params, params_from_iter, Row};

const ACTIVITY_COLUMNS: &str = "id, creator_id, created_ts, type, level, payload";

impl ActivityDriver for SqliteDriver {
    fn create_activity(&self, ctx: &Context, create: &Activity) -> DriverResult<Activity> {
        let payload = serde_json::to_string(&create.payload)?;
        let created_ts = (create.created_ts > 0).then_some(create.created_ts);
        let sql = format!(
            "INSERT INTO activity (creator_id, type, level, payload, created_ts)
             VALUES (?1, ?2, ?3, ?4, COALESCE(?5, CAST(strftime('%s', 'now') AS INTEGER)))
             RETURNING {ACTIVITY_COLUMNS};"
        );

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                &sql,
                params![
                    create.creator_id,
                    create.kind.as_str(),
                    create.level.as_str(),
                    payload,
                    created_ts,
                ],
                parse_activity_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("insert returned no activity row".to_string()))
        })
    }

    fn list_activities(&self, ctx: &Context, find: &FindActivity) -> DriverResult<Vec<Activity>> {
        let mut filter = Filter::new();
        filter.eq_opt("id = ?", find.id);
        filter.eq_opt("creator_id = ?", find.creator_id);
        filter.eq_opt("type = ?", find.kind.clone());
        filter.eq_opt("level = ?", find.level.map(|l| l.as_str().to_string()));

        let mut sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity{} ORDER BY created_ts DESC, id DESC",
            filter.where_sql()
        );
        filter.limit_offset(&mut sql, find.limit, 0);

        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_activity_row,
            )
        })
    }
}

fn parse_activity_row(row: &Row<'_>) -> DriverResult<Activity> {
    let level_text: String = row.get("level")?;
    let level = ActivityLevel::parse(&level_text).ok_or_else(|| {
        DriverError::InvalidData(format!("invalid level `{level_text}` in activity.level"))
    })?;
    let payload_text: String = row.get("payload")?;

    Ok(Activity {
        id: row.get("id")?,
        creator_id: row.get("creator_id")?,
        created_ts: row.get("created_ts")?,
        kind: row.get("type")?,
        level,
        payload: serde_json::from_str(&payload_text)?,
    })
}
