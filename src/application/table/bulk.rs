//! Row selection and sequential bulk actions.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<i64>,
}

impl Selection {
    pub fn toggle(&mut self, id: i64) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Selects every id on the page, or clears them when all are already selected.
    pub fn toggle_page(&mut self, page_ids: &[i64]) {
        if !page_ids.is_empty() && page_ids.iter().all(|id| self.ids.contains(id)) {
            for id in page_ids {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(page_ids.iter().copied());
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.ids.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<i64> for Selection {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Predicate deciding whether an action is unavailable for the current selection.
pub type DisabledWhen = Arc<dyn Fn(&Selection) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct BulkAction {
    pub id: &'static str,
    pub label: &'static str,
    pub confirm_message: Option<String>,
    pub disabled: Option<DisabledWhen>,
}

impl fmt::Debug for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("confirm_message", &self.confirm_message)
            .field("disabled", &self.disabled.is_some())
            .finish()
    }
}

impl BulkAction {
    pub fn new(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            confirm_message: None,
            disabled: None,
        }
    }

    pub fn confirm(mut self, message: impl Into<String>) -> Self {
        self.confirm_message = Some(message.into());
        self
    }

    pub fn disabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Selection) -> bool + Send + Sync + 'static,
    {
        self.disabled = Some(Arc::new(predicate));
        self
    }

    pub fn is_disabled(&self, selection: &Selection) -> bool {
        self.disabled
            .as_ref()
            .is_some_and(|predicate| predicate(selection))
    }
}

/// Work applied to one selected id.
#[async_trait]
pub trait BulkOperation: Send + Sync {
    async fn apply(&self, id: i64) -> Result<(), AppError>;
}

/// Asks the operator before a destructive action.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkError {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<BulkError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The operator declined; nothing ran and the selection is intact.
    Declined,
    /// Empty selection.
    Skipped,
    /// The action is unavailable for this selection; nothing ran.
    Disabled,
    Completed {
        report: BulkReport,
        reload_required: bool,
    },
}

/// Runs `operation` over the selection one id at a time.
///
/// Failures are recorded and never stop the run or trigger a retry. After a
/// completed run the selection is cleared and the table must reload.
pub async fn run_bulk(
    action: &BulkAction,
    selection: &mut Selection,
    operation: &dyn BulkOperation,
    confirm: &dyn Confirm,
) -> BulkOutcome {
    if selection.is_empty() {
        return BulkOutcome::Skipped;
    }
    if action.is_disabled(selection) {
        return BulkOutcome::Disabled;
    }
    if let Some(message) = &action.confirm_message {
        if !confirm.confirm(message) {
            return BulkOutcome::Declined;
        }
    }

    let mut report = BulkReport::default();
    for id in selection.ids() {
        match operation.apply(id).await {
            Ok(()) => report.success += 1,
            Err(err) => {
                warn!(action = action.id, id, error = %err, "bulk item failed");
                report.failed += 1;
                report.errors.push(BulkError {
                    id,
                    message: err.to_string(),
                });
            }
        }
    }
    info!(
        action = action.id,
        success = report.success,
        failed = report.failed,
        "bulk action finished"
    );
    selection.clear();
    BulkOutcome::Completed {
        report,
        reload_required: true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::infra::http::ApiError;

    struct Recording {
        calls: Mutex<Vec<i64>>,
        failing: i64,
    }

    #[async_trait]
    impl BulkOperation for Recording {
        async fn apply(&self, id: i64) -> Result<(), AppError> {
            self.calls.lock().expect("lock").push(id);
            if id == self.failing {
                return Err(ApiError::Status {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                }
                .into());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_run() {
        let operation = Recording {
            calls: Mutex::new(Vec::new()),
            failing: 3,
        };
        let mut selection: Selection = (1..=5).collect();
        let action = BulkAction::new("delete", "Delete").confirm("Delete 5 items?");

        let outcome = run_bulk(&action, &mut selection, &operation, &|_: &str| true).await;

        let (report, reload_required) = match outcome {
            BulkOutcome::Completed {
                report,
                reload_required,
            } => (report, reload_required),
            other => panic!("expected completion, got {other:?}"),
        };
        assert_eq!(report.success, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].id, 3);
        assert!(reload_required);
        assert!(selection.is_empty());
        assert_eq!(*operation.calls.lock().expect("lock"), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn declined_confirmation_changes_nothing() {
        let operation = Recording {
            calls: Mutex::new(Vec::new()),
            failing: 0,
        };
        let mut selection: Selection = [7, 8].into_iter().collect();
        let action = BulkAction::new("delete", "Delete").confirm("Sure?");

        let outcome = run_bulk(&action, &mut selection, &operation, &|_: &str| false).await;
        assert_eq!(outcome, BulkOutcome::Declined);
        assert_eq!(selection.len(), 2);
        assert!(operation.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn action_is_disabled_by_selection() {
        let operation = Recording {
            calls: Mutex::new(Vec::new()),
            failing: 0,
        };
        let action = BulkAction::new("delete", "Delete").disabled_when(|sel| sel.contains(1));

        let mut selection: Selection = [1, 2].into_iter().collect();
        let outcome = run_bulk(&action, &mut selection, &operation, &|_: &str| true).await;
        assert_eq!(outcome, BulkOutcome::Disabled);
        assert_eq!(selection.len(), 2);
        assert!(operation.calls.lock().expect("lock").is_empty());

        let mut selection: Selection = [2, 3].into_iter().collect();
        let outcome = run_bulk(&action, &mut selection, &operation, &|_: &str| true).await;
        assert!(matches!(outcome, BulkOutcome::Completed { .. }));
        assert_eq!(*operation.calls.lock().expect("lock"), vec![2, 3]);
    }

    #[tokio::test]
    async fn empty_selection_is_skipped() {
        let operation = Recording {
            calls: Mutex::new(Vec::new()),
            failing: 0,
        };
        let mut selection = Selection::default();
        let action = BulkAction::new("enable", "Enable");
        let outcome = run_bulk(&action, &mut selection, &operation, &|_: &str| true).await;
        assert_eq!(outcome, BulkOutcome::Skipped);
    }

    #[test]
    fn toggle_page_selects_then_clears() {
        let mut selection = Selection::default();
        selection.toggle(2);
        selection.toggle_page(&[1, 2, 3]);
        assert_eq!(selection.ids(), vec![1, 2, 3]);
        selection.toggle_page(&[1, 2, 3]);
        assert!(selection.is_empty());
        selection.toggle(4);
        selection.toggle(4);
        assert!(!selection.contains(4));
    }
}
