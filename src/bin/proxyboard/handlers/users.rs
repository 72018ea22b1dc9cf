#![deny(clippy::all, clippy::pedantic)]

use std::path::Path;

use async_trait::async_trait;
use proxyboard::application::error::AppError;
use proxyboard::application::table::{BulkAction, BulkOperation, user_table};
use proxyboard::domain::permissions::{PermissionLevel, VisibilityScope};
use proxyboard::infra::http::{ApiClient, RequestScope, TokenProvider};
use proxyboard_api_types::{PasswordChangeRequest, ResourceKind, User, UserPermissions};
use tracing::info;

use super::{build_query, bulk, collapsed_groups};
use crate::args::{ListArgs, PermissionsArgs, UsersCmd};
use crate::client::{CliError, Ctx};
use crate::io::{read_json, read_secret};
use crate::print::{print_json, render_view};

pub async fn handle(ctx: &Ctx, cmd: UsersCmd) -> Result<(), CliError> {
    let policy = ctx.require_admin().await?;
    match cmd {
        UsersCmd::List(args) => list(ctx, &args).await,
        UsersCmd::Get { id } => {
            let user = ctx.api.get_user(id, &ctx.scope()).await?;
            print_json(&user)
        }
        UsersCmd::Create { file } => create(ctx, &file).await,
        UsersCmd::Delete { ids, yes } => delete(ctx, policy.user_id(), ids, yes).await,
        UsersCmd::Permissions(args) => permissions(ctx, args).await,
        UsersCmd::Password {
            id,
            secret_file,
            secret_env,
        } => {
            let secret = read_secret(secret_file, secret_env)?;
            ctx.api
                .set_password(id, PasswordChangeRequest::password(None, secret), &ctx.scope())
                .await?;
            info!(id, "password changed");
            println!("Password updated for user #{id}");
            Ok(())
        }
        UsersCmd::LoginAs { id, store } => {
            let issued = ctx.api.login_as(id, &ctx.scope()).await?;
            if store {
                ctx.api.tokens().store(&issued.token)?;
                println!("Now acting as user #{id}");
            } else {
                println!("{}", issued.token);
            }
            Ok(())
        }
    }
}

async fn list(ctx: &Ctx, args: &ListArgs) -> Result<(), CliError> {
    let engine = user_table();
    let query = build_query(&engine, args, ctx.settings.table.rows_per_page)?;
    let users = ctx.api.list_users(&ctx.scope()).await?;
    let view = engine.compute(&users, &query, &collapsed_groups(args));
    if args.json {
        let rows: Vec<&User> = view.rows.iter().map(|row| row.item).collect();
        return print_json(&rows);
    }
    println!(
        "{}",
        render_view(&engine, &view, ctx.settings.table.breakpoints, ctx.width())
    );
    Ok(())
}

async fn create(ctx: &Ctx, path: &Path) -> Result<(), CliError> {
    let value = read_json(path)?;
    let user: User =
        serde_json::from_value(value.clone()).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    if !user.email.contains('@') {
        return Err(AppError::validation("email must be an email address").into());
    }
    let created = ctx.api.create_user(value, &ctx.scope()).await?;
    info!(id = created.id, "user created");
    println!("Created user #{} {}", created.id, created.email);
    Ok(())
}

struct DeleteUsers<'a> {
    api: &'a ApiClient,
    scope: RequestScope,
}

#[async_trait]
impl BulkOperation for DeleteUsers<'_> {
    async fn apply(&self, id: i64) -> Result<(), AppError> {
        Ok(self.api.delete_user(id, &self.scope).await?)
    }
}

async fn delete(
    ctx: &Ctx,
    current: Option<i64>,
    ids: Vec<i64>,
    yes: bool,
) -> Result<(), CliError> {
    // The signed-in account cannot delete itself.
    let action = BulkAction::new("delete", "Delete")
        .confirm(format!("Delete {} users?", ids.len()))
        .disabled_when(move |selection| current.is_some_and(|id| selection.contains(id)));
    let operation = DeleteUsers {
        api: &ctx.api,
        scope: ctx.scope(),
    };
    bulk::run(&action, ids, &operation, yes).await
}

/// Applies flag overrides on top of the current map; every value must be a known level.
pub fn merge_permissions(
    current: Option<UserPermissions>,
    args: &PermissionsArgs,
) -> Result<UserPermissions, CliError> {
    let mut merged = current.unwrap_or_default();
    if let Some(visibility) = args.visibility.as_deref() {
        visibility.parse::<VisibilityScope>().map_err(|()| {
            CliError::InvalidInput(format!("visibility must be all|user, got `{visibility}`"))
        })?;
        merged.visibility = Some(visibility.to_string());
    }

    let levels = [
        (ResourceKind::ProxyHosts, &args.proxy_hosts),
        (ResourceKind::RedirectionHosts, &args.redirection_hosts),
        (ResourceKind::DeadHosts, &args.dead_hosts),
        (ResourceKind::Streams, &args.streams),
        (ResourceKind::AccessLists, &args.access_lists),
        (ResourceKind::Certificates, &args.certificates),
    ];
    for (kind, value) in levels {
        let Some(value) = value.as_deref() else {
            continue;
        };
        value.parse::<PermissionLevel>().map_err(|()| {
            CliError::InvalidInput(format!(
                "{} must be hidden|view|manage, got `{value}`",
                kind.permission_key()
            ))
        })?;
        merged.set(kind.permission_key(), value);
    }
    Ok(merged)
}

async fn permissions(ctx: &Ctx, args: PermissionsArgs) -> Result<(), CliError> {
    let scope = ctx.scope();
    let user = ctx.api.get_user(args.id, &scope).await?;
    let merged = merge_permissions(user.permissions, &args)?;
    ctx.api.set_permissions(args.id, &merged, &scope).await?;
    info!(id = args.id, "permissions updated");
    print_json(&merged)
}
