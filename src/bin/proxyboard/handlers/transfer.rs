#![deny(clippy::all, clippy::pedantic)]

use std::collections::BTreeSet;

use proxyboard::application::error::AppError;
use proxyboard::application::gateway::ResourceGateway;
use proxyboard::application::transfer::{
    ConflictStrategy, ImportPlan, ImportSummary, export, export_bundle, run_import,
};
use proxyboard::domain::visibility::VisibilityFilter;
use proxyboard_api_types::ResourceKind;
use tracing::info;

use crate::args::{ExportArgs, ImportArgs};
use crate::client::{CliError, Ctx};
use crate::io::{read_bytes, write_output};
use crate::print::to_pretty;

pub async fn export_cmd(ctx: &Ctx, args: ExportArgs) -> Result<(), CliError> {
    let now = Ctx::now();
    let scope = ctx.scope();
    let envelope = match args.kind {
        Some(kind) => {
            let policy = ctx.require_view(kind).await?;
            let mut records = VisibilityFilter::new(&policy).filter(ctx.api.list(kind, &scope).await?);
            if !args.ids.is_empty() {
                let wanted: BTreeSet<i64> = args.ids.iter().copied().collect();
                records.retain(|record| wanted.contains(&record.id()));
            }
            info!(resource = %kind, count = records.len(), "exporting");
            export(kind, &records, now)?
        }
        None => {
            let policy = ctx.policy().await?;
            let bundle = export_bundle(&ctx.api, &policy, &scope, now).await;
            for (kind, message) in &bundle.failed {
                eprintln!("warning: {} not exported: {message}", kind.display_name());
            }
            for (kind, count) in &bundle.exported {
                info!(resource = %kind, count, "bundled");
            }
            bundle.envelope
        }
    };

    write_output(args.output.as_deref(), &to_pretty(&envelope)?)?;
    if let Some(path) = &args.output {
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}

pub fn describe_plan(plan: &ImportPlan) -> String {
    let mut lines = vec![format!(
        "{} export with {} item(s), {} selected",
        plan.kind,
        plan.len(),
        plan.selected_count()
    )];
    for (index, item) in plan.items.iter().enumerate() {
        lines.push(format!(
            "  [{}] {:>3}. {:<18} {}",
            if item.selected { "x" } else { " " },
            index + 1,
            item.kind().singular(),
            item.label()
        ));
    }
    lines.join("\n")
}

fn describe_summary(summary: &ImportSummary) -> String {
    let mut lines = vec![format!(
        "Imported {}, failed {}, skipped {}{}",
        summary.success,
        summary.failed,
        summary.skipped,
        if summary.cancelled { " (cancelled)" } else { "" }
    )];
    for issue in &summary.errors {
        lines.push(format!(
            "  failed {} {}: {}",
            issue.kind.singular(),
            issue.label,
            issue.message
        ));
    }
    for issue in &summary.skips {
        lines.push(format!(
            "  skipped {} {}: {}",
            issue.kind.singular(),
            issue.label,
            issue.message
        ));
    }
    lines.join("\n")
}

pub async fn import_cmd(ctx: &Ctx, args: ImportArgs) -> Result<(), CliError> {
    let bytes = read_bytes(&args.file)?;
    let mut plan = ImportPlan::parse(&bytes)?;

    if !args.select.is_empty() {
        if let Some(bad) = args.select.iter().find(|n| **n == 0 || **n > plan.len()) {
            return Err(CliError::InvalidInput(format!(
                "no item {bad}; the file has {} item(s)",
                plan.len()
            )));
        }
        let indices: Vec<usize> = args.select.iter().map(|n| n - 1).collect();
        plan.select_only(&indices);
    }

    let strategy = match args.strategy.as_deref() {
        Some(raw) => raw
            .parse::<ConflictStrategy>()
            .map_err(CliError::InvalidInput)?,
        None => ctx.settings.import.strategy,
    };

    if args.dry_run {
        println!("{}", describe_plan(&plan));
        println!("Conflict strategy: {strategy}");
        return Ok(());
    }

    let policy = ctx.policy().await?;
    let kinds: BTreeSet<ResourceKind> = plan
        .items
        .iter()
        .filter(|item| item.selected)
        .map(|item| item.kind())
        .collect();
    if let Some(kind) = kinds.iter().find(|kind| !policy.can_manage(**kind)) {
        return Err(AppError::permission_denied(format!(
            "you cannot manage {}",
            kind.display_name().to_lowercase()
        ))
        .into());
    }

    let summary = run_import(ctx.gateway(), &plan, strategy, &ctx.scope()).await;
    println!("{}", describe_summary(&summary));
    if summary.failed > 0 {
        return Err(CliError::Partial {
            failed: summary.failed,
            total: plan.selected_count(),
        });
    }
    Ok(())
}
