use super::query::{Filter, Patch};
use super::{parse_row_status, query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, UserDriver};
use crate::model::{DeleteUser, FindUser, Role, UpdateUser, User};
use log::info;
use rusqlite::{params, params_from_iter, Row};

const USER_COLUMNS: &str = "id, created_ts, updated_ts, row_status, username, role, email, \
                            nickname, password_hash, avatar_url";

impl UserDriver for SqliteDriver {
    fn create_user(&self, ctx: &Context, create: &User) -> DriverResult<User> {
        self.with_connection(ctx, |conn| {
            let sql = format!(
                "INSERT INTO user (username, role, email, nickname, password_hash, avatar_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {USER_COLUMNS};"
            );
            query_one(
                conn,
                &sql,
                params![
                    create.username.as_str(),
                    create.role.as_str(),
                    create.email.as_str(),
                    create.nickname.as_str(),
                    create.password_hash.as_str(),
                    create.avatar_url.as_str(),
                ],
                parse_user_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("insert returned no user row".to_string()))
        })
    }

    fn update_user(&self, ctx: &Context, update: &UpdateUser) -> DriverResult<User> {
        if update.is_empty() {
            return Err(DriverError::InvalidArgument(
                "user update has no fields set".to_string(),
            ));
        }

        let mut patch = Patch::new();
        patch.set("row_status = ?", update.row_status.map(|s| s.as_str().to_string()));
        patch.set("username = ?", update.username.clone());
        patch.set("role = ?", update.role.map(|r| r.as_str().to_string()));
        patch.set("email = ?", update.email.clone());
        patch.set("nickname = ?", update.nickname.clone());
        patch.set("password_hash = ?", update.password_hash.clone());
        patch.set("avatar_url = ?", update.avatar_url.clone());
        match update.updated_ts {
            Some(ts) => patch.set("updated_ts = ?", Some(ts)),
            None => patch.raw("updated_ts = CAST(strftime('%s', 'now') AS INTEGER)"),
        }

        let sql = format!(
            "UPDATE user{} WHERE id = ? RETURNING {USER_COLUMNS};",
            patch.set_sql()
        );
        let args = patch.into_args(update.id);

        self.with_connection(ctx, |conn| {
            query_one(conn, &sql, params_from_iter(args), parse_user_row)?
                .ok_or_else(|| DriverError::not_found("user", update.id))
        })
    }

    fn list_users(&self, ctx: &Context, find: &FindUser) -> DriverResult<Vec<User>> {
        let mut filter = Filter::new();
        filter.eq_opt("id = ?", find.id);
        filter.eq_opt("row_status = ?", find.row_status.map(|s| s.as_str().to_string()));
        filter.eq_opt("username = ?", find.username.clone());
        filter.eq_opt("role = ?", find.role.map(|r| r.as_str().to_string()));
        filter.eq_opt("email = ?", find.email.clone());
        filter.eq_opt("nickname = ?", find.nickname.clone());

        let mut sql = format!(
            "SELECT {USER_COLUMNS} FROM user{} ORDER BY created_ts DESC, id DESC",
            filter.where_sql()
        );
        filter.limit_offset(&mut sql, find.limit, 0);

        self.with_connection(ctx, |conn| {
            query_all(
                conn,
                &sql,
                params_from_iter(filter.into_args()),
                parse_user_row,
            )
        })
    }

    fn delete_user(&self, ctx: &Context, delete: &DeleteUser) -> DriverResult<()> {
        // Owned memos, resources, tags and settings go with the row.
        let deleted = self.with_connection(ctx, |conn| {
            Ok(conn.execute("DELETE FROM user WHERE id = ?1;", [delete.id])?)
        })?;
        if deleted > 0 {
            info!(
                "event=user_delete module=driver status=ok user_id={}",
                delete.id
            );
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> DriverResult<User> {
    let status_text: String = row.get("row_status")?;
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text)
        .ok_or_else(|| DriverError::InvalidData(format!("invalid role `{role_text}` in user.role")))?;

    Ok(User {
        id: row.get("id")?,
        row_status: parse_row_status(&status_text, "user.row_status")?,
        created_ts: row.get("created_ts")?,
        updated_ts: row.get("updated_ts")?,
        username: row.get("username")?,
        role,
        email: row.get("email")?,
        nickname: row.get("nickname")?,
        password_hash: row.get("password_hash")?,
        avatar_url: row.get("avatar_url")?,
    })
}
