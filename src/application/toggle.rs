//! Optimistic enable/disable of a single row.

use proxyboard_api_types::ResourceKind;
use tracing::{debug, warn};

use crate::application::error::AppError;
use crate::application::gateway::ResourceGateway;
use crate::domain::error::DomainError;
use crate::infra::http::RequestScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Committed(bool),
    Pending { previous: bool, optimistic: bool },
}

impl ToggleState {
    /// Value shown to the user: the optimistic one while a request is in flight.
    pub fn displayed(self) -> bool {
        match self {
            Self::Committed(value) => value,
            Self::Pending { optimistic, .. } => optimistic,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Flips the displayed value before the request is sent.
    pub fn begin(&mut self, target: bool) -> Result<(), DomainError> {
        match *self {
            Self::Committed(previous) => {
                *self = Self::Pending {
                    previous,
                    optimistic: target,
                };
                Ok(())
            }
            Self::Pending { .. } => Err(DomainError::invariant(
                "a toggle is already in flight for this row",
            )),
        }
    }

    /// Commits the optimistic value on success, reverts otherwise.
    pub fn settle(&mut self, succeeded: bool) -> bool {
        let committed = match *self {
            Self::Pending {
                previous,
                optimistic,
            } => {
                if succeeded {
                    optimistic
                } else {
                    previous
                }
            }
            Self::Committed(value) => value,
        };
        *self = Self::Committed(committed);
        committed
    }
}

/// Sends the enable/disable call for one row and settles `state` with the result.
///
/// The success path does not reload the table.
pub async fn toggle_enabled(
    gateway: &dyn ResourceGateway,
    kind: ResourceKind,
    id: i64,
    state: &mut ToggleState,
    target: bool,
    scope: &RequestScope,
) -> Result<bool, AppError> {
    if !kind.supports_toggle() {
        return Err(AppError::validation(format!(
            "{} cannot be enabled or disabled",
            kind.display_name()
        )));
    }
    state.begin(target)?;
    match gateway.set_enabled(kind, id, target, scope).await {
        Ok(()) => {
            debug!(resource = %kind, id, enabled = target, "toggle committed");
            Ok(state.settle(true))
        }
        Err(err) => {
            warn!(resource = %kind, id, error = %err, "toggle failed, reverting");
            state.settle(false);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateway::fake::FakeGateway;

    #[test]
    fn pending_shows_optimistic_value() {
        let mut state = ToggleState::Committed(true);
        state.begin(false).expect("begin");
        assert!(!state.displayed());
        assert!(state.is_pending());
        assert!(state.begin(true).is_err());
        assert!(!state.settle(true));
        assert_eq!(state, ToggleState::Committed(false));
    }

    #[tokio::test]
    async fn failure_reverts_to_previous() {
        let gateway = FakeGateway::new();
        gateway.fail_id(9);
        let mut state = ToggleState::Committed(true);
        let result = toggle_enabled(
            &gateway,
            ResourceKind::ProxyHosts,
            9,
            &mut state,
            false,
            &RequestScope::detached(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(state, ToggleState::Committed(true));
    }

    #[tokio::test]
    async fn success_commits_without_reload() {
        let gateway = FakeGateway::new();
        let mut state = ToggleState::Committed(false);
        let value = toggle_enabled(
            &gateway,
            ResourceKind::Streams,
            3,
            &mut state,
            true,
            &RequestScope::detached(),
        )
        .await
        .expect("toggle");
        assert!(value);
        assert_eq!(gateway.toggled(), vec![(ResourceKind::Streams, 3, true)]);
        assert_eq!(gateway.list_calls(), 0);
    }

    #[tokio::test]
    async fn certificates_cannot_toggle() {
        let gateway = FakeGateway::new();
        let mut state = ToggleState::Committed(true);
        let result = toggle_enabled(
            &gateway,
            ResourceKind::Certificates,
            1,
            &mut state,
            false,
            &RequestScope::detached(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(state, ToggleState::Committed(true));
    }
}
