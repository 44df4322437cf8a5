use super::query::{Filter, Patch};
use super::{query_all, query_one, SqliteDriver};
use crate::context::Context;
use crate::driver::{DriverError, DriverResult, IdentityProviderDriver};
use crate::model::{
    DeleteIdentityProvider, FindIdentityProvider, IdentityProvider, IdentityProviderType,
    UpdateIdentityProvider,
};
use rusqlite::{params, params_from_iter, Row};

const IDP_COLUMNS: &str = "id, name, type, identifier_filter, config";

impl IdentityProviderDriver for SqliteDriver {
    fn create_identity_provider(
        &self,
        ctx: &Context,
        create: &IdentityProvider,
    ) -> DriverResult<IdentityProvider> {
        let config = serde_json::to_string(&create.config)?;
        let sql = format!(
            "INSERT INTO idp (name, type, identifier_filter, config)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {IDP_COLUMNS};"
        );

        self.with_connection(ctx, |conn| {
            query_one(
                conn,
                &sql,
                params![
                    create.name.as_str(),
                    create.kind.as_str(),
                    create.identifier_filter.as_str(),
                    config,
                ],
                parse_idp_row,
            )?
            .ok_or_else(|| DriverError::InvalidData("insert returned no idp row".to_string()))
        })
    }

    fn list_identity_providers(
        &self,
        ctx: &Context,
        find: &FindIdentityProvider,
    ) -> DriverResult<Vec<IdentityProvider>> {
        list_idps(self, ctx, find, None)
    }

    fn get_identity_provider(
        &self,
        ctx: &Context,
        find: &FindIdentityProvider,
    ) -> DriverResult<Option<IdentityProvider>> {
        Ok(list_idps(self, ctx, find, Some(1))?.into_iter().next())
    }

    fn update_identity_provider(
        &self,
        ctx: &Context,
        update: &UpdateIdentityProvider,
    ) -> DriverResult<IdentityProvider> {
        if update.is_empty() {
            return Err(DriverError::InvalidArgument(
                "identity provider update has no fields set".to_string(),
            ));
        }

        let config = update
            .config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let mut patch = Patch::new();
        patch.set("name = ?", update.name.clone());
        patch.set("identifier_filter = ?", update.identifier_filter.clone());
        patch.set("config = ?", config);

        let sql = format!(
            "UPDATE idp{} WHERE id = ? RETURNING {IDP_COLUMNS};",
            patch.set_sql()
        );
        let args = patch.into_args(update.id);

        self.with_connection(ctx, |conn| {
            query_one(conn, &sql, params_from_iter(args), parse_idp_row)?
                .ok_or_else(|| DriverError::not_found("identity provider", update.id))
        })
    }

    fn delete_identity_provider(
        &self,
        ctx: &Context,
        delete: &DeleteIdentityProvider,
    ) -> DriverResult<()> {
        self.with_connection(ctx, |conn| {
            conn.execute("DELETE FROM idp WHERE id = ?1;", [delete.id])?;
            Ok(())
        })
    }
}

fn list_idps(
    driver: &SqliteDriver,
    ctx: &Context,
    find: &FindIdentityProvider,
    limit: Option<u32>,
) -> DriverResult<Vec<IdentityProvider>> {
    let mut filter = Filter::new();
    filter.eq_opt("id = ?", find.id);

    let mut sql = format!(
        "SELECT {IDP_COLUMNS} FROM idp{} ORDER BY id ASC",
        filter.where_sql()
    );
    filter.limit_offset(&mut sql, limit, 0);

    driver.with_connection(ctx, |conn| {
        query_all(conn, &sql, params_from_iter(filter.into_args()), parse_idp_row)
    })
}

fn parse_idp_row(row: &Row<'_>) -> DriverResult<IdentityProvider> {
    let kind_text: String = row.get("type")?;
    let kind = IdentityProviderType::parse(&kind_text).ok_or_else(|| {
        DriverError::InvalidData(format!("invalid provider type `{kind_text}` in idp.type"))
    })?;
    let config_text: String = row.get("config")?;

    Ok(IdentityProvider {
        id: row.get("id")?,
        name: row.get("name")?,
        kind,
        identifier_filter: row.get("identifier_filter")?,
        config: serde_json::from_str(&config_text)?,
    })
}
