#![deny(clippy::all, clippy::pedantic)]

use async_trait::async_trait;
use proxyboard::application::error::AppError;
use proxyboard::application::gateway::ResourceGateway;
use proxyboard::application::table::{
    BulkAction, BulkOperation, BulkOutcome, Confirm, Selection, run_bulk,
};
use proxyboard::application::toggle::{ToggleState, toggle_enabled};
use proxyboard::infra::http::RequestScope;
use proxyboard_api_types::ResourceKind;

use crate::client::CliError;
use crate::io::confirm_prompt;

pub struct DeleteRecords<'a> {
    pub gateway: &'a dyn ResourceGateway,
    pub kind: ResourceKind,
    pub scope: RequestScope,
}

#[async_trait]
impl BulkOperation for DeleteRecords<'_> {
    async fn apply(&self, id: i64) -> Result<(), AppError> {
        Ok(self.gateway.delete(self.kind, id, &self.scope).await?)
    }
}

/// Each row goes through the optimistic toggle, starting from the opposite state.
pub struct SetEnabled<'a> {
    pub gateway: &'a dyn ResourceGateway,
    pub kind: ResourceKind,
    pub enabled: bool,
    pub scope: RequestScope,
}

#[async_trait]
impl BulkOperation for SetEnabled<'_> {
    async fn apply(&self, id: i64) -> Result<(), AppError> {
        let mut state = ToggleState::Committed(!self.enabled);
        toggle_enabled(
            self.gateway,
            self.kind,
            id,
            &mut state,
            self.enabled,
            &self.scope,
        )
        .await?;
        Ok(())
    }
}

/// Runs `operation` over `ids`, prompting unless `assume_yes`.
pub async fn run(
    action: &BulkAction,
    ids: Vec<i64>,
    operation: &dyn BulkOperation,
    assume_yes: bool,
) -> Result<(), CliError> {
    let mut selection: Selection = ids.into_iter().collect();
    let total = selection.len();
    let always = |_: &str| true;
    let confirm: &dyn Confirm = if assume_yes { &always } else { &confirm_prompt };

    match run_bulk(action, &mut selection, operation, confirm).await {
        BulkOutcome::Declined => {
            eprintln!("{} cancelled", action.label);
            Ok(())
        }
        BulkOutcome::Skipped => {
            eprintln!("nothing to {}", action.label.to_lowercase());
            Ok(())
        }
        BulkOutcome::Disabled => Err(AppError::validation(format!(
            "{} is not available for this selection",
            action.label
        ))
        .into()),
        BulkOutcome::Completed { report, .. } => {
            println!(
                "{}: {} succeeded, {} failed",
                action.label, report.success, report.failed
            );
            for error in &report.errors {
                eprintln!("  #{}: {}", error.id, error.message);
            }
            if report.failed > 0 {
                return Err(CliError::Partial {
                    failed: report.failed,
                    total,
                });
            }
            Ok(())
        }
    }
}
