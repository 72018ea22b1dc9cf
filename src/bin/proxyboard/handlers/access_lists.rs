#![deny(clippy::all, clippy::pedantic)]

use proxyboard::application::error::AppError;
use proxyboard::application::gateway::ResourceGateway;
use proxyboard::domain::access::{AccessSummary, describe_clients, replace_client, satisfy_description};
use proxyboard::domain::validation::validate_record;
use proxyboard::domain::visibility::VisibilityFilter;
use proxyboard_api_types::{AccessList, AccessListClient, ResourceKind, ResourceRecord};
use tracing::info;

use super::resources;
use crate::args::{AccessListsCmd, DirectiveArg};
use crate::client::{CliError, Ctx};

const KIND: ResourceKind = ResourceKind::AccessLists;

pub async fn handle(ctx: &Ctx, cmd: AccessListsCmd) -> Result<(), CliError> {
    match cmd {
        AccessListsCmd::Common(cmd) => resources::handle(ctx, KIND, cmd).await,
        AccessListsCmd::Rules { id } => rules(ctx, id).await,
        AccessListsCmd::SetRule {
            id,
            position,
            address,
            directive,
        } => set_rule(ctx, id, position, address, directive).await,
    }
}

async fn fetch(ctx: &Ctx, id: i64, manage: bool) -> Result<AccessList, CliError> {
    let policy = if manage {
        ctx.require_manage(KIND).await?
    } else {
        ctx.require_view(KIND).await?
    };
    match ctx.api.get(KIND, id, &ctx.scope()).await? {
        ResourceRecord::AccessList(list) if VisibilityFilter::new(&policy).is_visible(&list) => {
            Ok(list)
        }
        _ => Err(AppError::NotFound.into()),
    }
}

pub fn render_rules(list: &AccessList) -> String {
    let mut lines = vec![
        format!("{} ({})", list.name, AccessSummary::of(list).describe()),
        satisfy_description(list.satisfy_any).to_string(),
    ];
    if !list.items.is_empty() {
        lines.push("Users:".to_string());
        lines.extend(list.items.iter().map(|item| format!("  {}", item.username)));
    }
    if !list.clients.is_empty() {
        lines.push("Rules:".to_string());
        lines.extend(
            describe_clients(&list.clients)
                .into_iter()
                .enumerate()
                .map(|(index, rule)| format!("  {}. {rule}", index + 1)),
        );
    }
    lines.join("\n")
}

async fn rules(ctx: &Ctx, id: i64) -> Result<(), CliError> {
    let list = fetch(ctx, id, false).await?;
    println!("{}", render_rules(&list));
    Ok(())
}

async fn set_rule(
    ctx: &Ctx,
    id: i64,
    position: usize,
    address: String,
    directive: DirectiveArg,
) -> Result<(), CliError> {
    let mut list = fetch(ctx, id, true).await?;
    let client = AccessListClient {
        address,
        directive: directive.into(),
    };
    let replaced = position
        .checked_sub(1)
        .is_some_and(|index| replace_client(&mut list.clients, index, client));
    if !replaced {
        return Err(CliError::InvalidInput(format!(
            "access list #{id} has no rule at position {position}"
        )));
    }

    let record = ResourceRecord::AccessList(list);
    validate_record(&record)?;
    ctx.api
        .update(KIND, id, record.editable_fields(), &ctx.scope())
        .await?;
    info!(id, position, "access rule replaced");
    if let ResourceRecord::AccessList(list) = &record {
        println!("{}", render_rules(list));
    }
    Ok(())
}
