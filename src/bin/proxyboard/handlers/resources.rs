#![deny(clippy::all, clippy::pedantic)]

use std::path::Path;

use proxyboard::application::error::AppError;
use proxyboard::application::gateway::ResourceGateway;
use proxyboard::application::table::{BulkAction, resource_table};
use proxyboard::domain::validation::{validate_proxy_host, validate_record};
use proxyboard::domain::visibility::VisibilityFilter;
use proxyboard_api_types::{ProxyHost, ResourceKind, ResourceRecord};
use serde_json::Value;
use tracing::info;

use super::bulk::{self, DeleteRecords, SetEnabled};
use super::{build_query, collapsed_groups};
use crate::args::{ListArgs, ProxyHostAddArgs, ResourceCmd};
use crate::client::{CliError, Ctx};
use crate::io::read_json;
use crate::print::{print_json, render_view};

pub async fn handle(ctx: &Ctx, kind: ResourceKind, cmd: ResourceCmd) -> Result<(), CliError> {
    match cmd {
        ResourceCmd::List(args) => list(ctx, kind, &args).await,
        ResourceCmd::Get { id } => get(ctx, kind, id).await,
        ResourceCmd::Create { file } => create(ctx, kind, &file).await,
        ResourceCmd::Update { id, file } => update(ctx, kind, id, &file).await,
        ResourceCmd::Delete { ids, yes } => delete(ctx, kind, ids, yes).await,
        ResourceCmd::Enable { ids } => set_enabled(ctx, kind, ids, true, true).await,
        ResourceCmd::Disable { ids, yes } => set_enabled(ctx, kind, ids, false, yes).await,
    }
}

async fn list(ctx: &Ctx, kind: ResourceKind, args: &ListArgs) -> Result<(), CliError> {
    let policy = ctx.require_view(kind).await?;
    let engine = resource_table(kind, Ctx::now());
    let query = build_query(&engine, args, ctx.settings.table.rows_per_page)?;

    let fetched = ctx.api.list(kind, &ctx.scope()).await?;
    let visibility = VisibilityFilter::new(&policy);
    let report = visibility.report(&fetched);
    let records = visibility.filter(fetched);

    let view = engine.compute(&records, &query, &collapsed_groups(args));
    if args.json {
        let rows: Vec<Value> = view.rows.iter().map(|row| row.item.to_value()).collect();
        return print_json(&rows);
    }
    if let Some(banner) = report.banner() {
        eprintln!("{banner}");
    }
    println!(
        "{}",
        render_view(&engine, &view, ctx.settings.table.breakpoints, ctx.width())
    );
    Ok(())
}

async fn get(ctx: &Ctx, kind: ResourceKind, id: i64) -> Result<(), CliError> {
    let policy = ctx.require_view(kind).await?;
    let record = ctx.api.get(kind, id, &ctx.scope()).await?;
    if !VisibilityFilter::new(&policy).is_visible(&record) {
        return Err(AppError::NotFound.into());
    }
    print_json(&record.to_value())
}

/// Parses and validates a payload file; nothing is sent when it is invalid.
fn load_payload(kind: ResourceKind, path: &Path) -> Result<ResourceRecord, CliError> {
    let value = read_json(path)?;
    let record = ResourceRecord::from_value(kind, value)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;
    validate_record(&record)?;
    Ok(record)
}

async fn create(ctx: &Ctx, kind: ResourceKind, path: &Path) -> Result<(), CliError> {
    let record = load_payload(kind, path)?;
    ctx.require_manage(kind).await?;
    let created = ctx
        .api
        .create(kind, record.editable_fields(), &ctx.scope())
        .await?;
    info!(resource = %kind, id = created.id(), "created");
    println!("Created {} #{} {}", kind.singular(), created.id(), created.label());
    Ok(())
}

async fn update(ctx: &Ctx, kind: ResourceKind, id: i64, path: &Path) -> Result<(), CliError> {
    let record = load_payload(kind, path)?;
    ctx.require_manage(kind).await?;
    let updated = ctx
        .api
        .update(kind, id, record.editable_fields(), &ctx.scope())
        .await?;
    info!(resource = %kind, id, "updated");
    println!("Updated {} #{} {}", kind.singular(), updated.id(), updated.label());
    Ok(())
}

async fn delete(ctx: &Ctx, kind: ResourceKind, ids: Vec<i64>, yes: bool) -> Result<(), CliError> {
    ctx.require_manage(kind).await?;
    let action = BulkAction::new("delete", "Delete").confirm(format!(
        "Delete {} {}?",
        ids.len(),
        kind.display_name().to_lowercase()
    ));
    let operation = DeleteRecords {
        gateway: &ctx.api,
        kind,
        scope: ctx.scope(),
    };
    bulk::run(&action, ids, &operation, yes).await
}

async fn set_enabled(
    ctx: &Ctx,
    kind: ResourceKind,
    ids: Vec<i64>,
    enabled: bool,
    yes: bool,
) -> Result<(), CliError> {
    if !kind.supports_toggle() {
        return Err(AppError::validation(format!(
            "{} cannot be enabled or disabled",
            kind.display_name()
        ))
        .into());
    }
    ctx.require_manage(kind).await?;
    let action = if enabled {
        BulkAction::new("enable", "Enable")
    } else {
        BulkAction::new("disable", "Disable").confirm(format!(
            "Disable {} {}?",
            ids.len(),
            kind.display_name().to_lowercase()
        ))
    };
    let operation = SetEnabled {
        gateway: &ctx.api,
        kind,
        enabled,
        scope: ctx.scope(),
    };
    bulk::run(&action, ids, &operation, yes).await
}

pub fn proxy_host_from_args(args: ProxyHostAddArgs) -> ProxyHost {
    let mut host = ProxyHost::new(args.domains, args.forward_host, args.forward_port);
    host.forward_scheme = args.scheme.as_str().to_string();
    host.certificate_id = args.certificate_id;
    host.access_list_id = args.access_list_id;
    host.ssl_forced = args.ssl_forced;
    host.http2_support = args.http2;
    host.hsts_enabled = args.hsts;
    host.block_exploits = args.block_exploits;
    host.allow_websocket_upgrade = args.websockets;
    host.caching_enabled = args.caching;
    host
}

/// Builds a proxy host from flags; validation runs before any request.
pub async fn add_proxy_host(ctx: &Ctx, args: ProxyHostAddArgs) -> Result<(), CliError> {
    let host = proxy_host_from_args(args);
    validate_proxy_host(&host)?;
    let kind = ResourceKind::ProxyHosts;
    ctx.require_manage(kind).await?;
    let record = ResourceRecord::ProxyHost(host);
    let created = ctx
        .api
        .create(kind, record.editable_fields(), &ctx.scope())
        .await?;
    info!(id = created.id(), "proxy host created");
    println!("Created proxy host #{} {}", created.id(), created.label());
    Ok(())
}
