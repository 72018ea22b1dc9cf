#![deny(clippy::all, clippy::pedantic)]

use proxyboard::application::search::GlobalSearch;
use serde_json::json;

use crate::args::SearchArgs;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, args: SearchArgs) -> Result<(), CliError> {
    let policy = ctx.policy().await?;
    let mut search = GlobalSearch::new(ctx.gateway(), policy, ctx.settings.search.ttl);
    let report = search.preload(false, &ctx.scope()).await;
    for (kind, message) in &report.failed {
        eprintln!("warning: {} unavailable: {message}", kind.display_name());
    }

    let results = search.results(&args.query);
    let actions = if args.actions {
        search.quick_actions(&args.query)
    } else {
        Vec::new()
    };

    if args.json {
        let routes: Vec<String> = results.iter().map(|r| r.route()).collect();
        return print_json(&json!({
            "results": results,
            "routes": routes,
            "actions": actions,
        }));
    }

    if results.is_empty() {
        println!("No results for \"{}\"", args.query);
    }
    for result in &results {
        let status = result
            .metadata
            .iter()
            .find(|(key, _)| *key == "status")
            .map(|(_, value)| format!(" [{value}]"))
            .unwrap_or_default();
        println!(
            "{:<18} {}{status}\n{:<18} {}",
            result.kind.singular(),
            result.title,
            result.route(),
            result.subtitle
        );
    }
    for action in &actions {
        println!("{}  ->  {}", action.label, action.command);
    }
    Ok(())
}
