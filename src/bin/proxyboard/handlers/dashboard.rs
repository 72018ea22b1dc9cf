#![deny(clippy::all, clippy::pedantic)]

use proxyboard::application::dashboard::{Dashboard, load_dashboard};

use crate::client::{CliError, Ctx};

pub fn render(dashboard: &Dashboard) -> String {
    let mut lines = Vec::new();
    for (kind, counts) in &dashboard.counts {
        let mut line = format!("{:<18} {:>4}", kind.display_name(), counts.total);
        if kind.supports_toggle() {
            line.push_str(&format!(
                "  ({} enabled, {} disabled, {} offline)",
                counts.enabled, counts.disabled, counts.offline
            ));
        }
        lines.push(line);
    }
    if !dashboard.expiry.is_empty() {
        let bands: Vec<String> = dashboard
            .expiry
            .iter()
            .map(|(band, count)| format!("{band} {count}"))
            .collect();
        lines.push(format!("Certificate expiry: {}", bands.join(", ")));
    }
    let urgent = dashboard.urgent_certificates();
    if urgent > 0 {
        lines.push(format!("{urgent} certificate(s) expired or expiring within 7 days"));
    }
    for (kind, message) in &dashboard.failed {
        lines.push(format!("{} unavailable: {message}", kind.display_name()));
    }
    lines.join("\n")
}

pub async fn handle(ctx: &Ctx) -> Result<(), CliError> {
    let policy = ctx.policy().await?;
    let dashboard = load_dashboard(&ctx.api, &policy, &ctx.scope(), Ctx::now()).await;
    println!("{}", render(&dashboard));
    Ok(())
}
