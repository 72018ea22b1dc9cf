#![deny(clippy::all, clippy::pedantic)]

use serde_json::{Value, json};
use tracing::info;

use crate::args::SettingsCmd;
use crate::client::{CliError, Ctx};
use crate::io::parse_loose_value;
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: SettingsCmd) -> Result<(), CliError> {
    ctx.require_admin().await?;
    match cmd {
        SettingsCmd::List => list(ctx).await,
        SettingsCmd::Get { id } => {
            let setting = ctx.api.get_setting(&id, &ctx.scope()).await?;
            print_json(&setting)
        }
        SettingsCmd::Set { id, value } => set(ctx, &id, &value).await,
    }
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

async fn list(ctx: &Ctx) -> Result<(), CliError> {
    let settings = ctx.api.list_settings(&ctx.scope()).await?;
    let width = settings.iter().map(|s| s.id.len()).max().unwrap_or_default();
    for setting in settings {
        println!("{:<width$}  {}", setting.id, compact(&setting.value));
    }
    Ok(())
}

/// Keeps the setting's current `meta` so only the value changes.
async fn set(ctx: &Ctx, id: &str, raw: &str) -> Result<(), CliError> {
    let scope = ctx.scope();
    let current = ctx.api.get_setting(id, &scope).await?;
    let body = json!({
        "value": parse_loose_value(raw),
        "meta": current.meta,
    });
    let updated = ctx.api.update_setting(id, body, &scope).await?;
    info!(setting = id, "setting updated");
    println!("{} = {}", updated.id, compact(&updated.value));
    Ok(())
}
