#![deny(clippy::all, clippy::pedantic)]

use proxyboard_api_types::AuditLogEntry;
use time::format_description::well_known::Rfc3339;

use crate::args::AuditCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: AuditCmd) -> Result<(), CliError> {
    match cmd {
        AuditCmd::List { limit, json } => list(ctx, limit, json).await,
    }
}

pub fn describe(entry: &AuditLogEntry) -> String {
    let when = entry
        .created_on
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string());
    let who = entry.user.as_ref().map_or_else(
        || format!("user #{}", entry.user_id),
        |user| user.name.clone(),
    );
    format!(
        "{when}  {who} {} {} #{}",
        entry.action,
        entry.object_type.replace('-', " "),
        entry.object_id
    )
}

async fn list(ctx: &Ctx, limit: usize, json: bool) -> Result<(), CliError> {
    ctx.require_admin().await?;
    let mut entries = ctx.api.audit_log(&ctx.scope()).await?;
    entries.truncate(limit);
    if json {
        return print_json(&entries);
    }
    for entry in &entries {
        println!("{}", describe(entry));
    }
    Ok(())
}
