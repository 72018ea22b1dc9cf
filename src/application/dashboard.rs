//! Per-resource counts for the landing screen.

use std::collections::BTreeMap;

use futures::future::join_all;
use proxyboard_api_types::{ResourceKind, ResourceRecord};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::gateway::ResourceGateway;
use crate::application::table::status_label;
use crate::domain::certificates::{ExpiryBand, expiry_status};
use crate::domain::permissions::AccessPolicy;
use crate::domain::visibility::VisibilityFilter;
use crate::infra::http::RequestScope;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceCounts {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub offline: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub counts: BTreeMap<ResourceKind, ResourceCounts>,
    /// Certificates per expiry band; certificates without an expiry are not counted.
    pub expiry: BTreeMap<ExpiryBand, usize>,
    pub failed: Vec<(ResourceKind, String)>,
}

impl Dashboard {
    /// Certificates that are expired or expire within a week.
    pub fn urgent_certificates(&self) -> usize {
        [ExpiryBand::Expired, ExpiryBand::Critical]
            .iter()
            .filter_map(|band| self.expiry.get(band))
            .sum()
    }
}

fn count(records: &[ResourceRecord]) -> ResourceCounts {
    let mut counts = ResourceCounts {
        total: records.len(),
        ..ResourceCounts::default()
    };
    for record in records {
        match status_label(record) {
            "disabled" => counts.disabled += 1,
            "offline" => {
                counts.enabled += 1;
                counts.offline += 1;
            }
            _ => {
                if record.enabled().is_some() {
                    counts.enabled += 1;
                }
            }
        }
    }
    counts
}

/// Loads every viewable core resource concurrently; failures are reported per kind.
pub async fn load_dashboard(
    gateway: &dyn ResourceGateway,
    policy: &AccessPolicy,
    scope: &RequestScope,
    now: OffsetDateTime,
) -> Dashboard {
    let kinds: Vec<ResourceKind> = ResourceKind::CORE
        .into_iter()
        .filter(|kind| policy.can_view(*kind))
        .collect();
    let settled = join_all(
        kinds
            .iter()
            .map(|kind| async move { (*kind, gateway.list(*kind, scope).await) }),
    )
    .await;

    let visibility = VisibilityFilter::new(policy);
    let mut dashboard = Dashboard::default();
    for (kind, outcome) in settled {
        match outcome {
            Ok(records) => {
                let records = visibility.filter(records);
                if kind == ResourceKind::Certificates {
                    for record in &records {
                        if let ResourceRecord::Certificate(cert) = record {
                            if let Some((_, band)) = expiry_status(cert, now) {
                                *dashboard.expiry.entry(band).or_insert(0) += 1;
                            }
                        }
                    }
                }
                dashboard.counts.insert(kind, count(&records));
            }
            Err(err) => {
                warn!(resource = %kind, error = %err, "dashboard count failed");
                dashboard.failed.push((kind, err.to_string()));
            }
        }
    }
    dashboard
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;
    use crate::application::gateway::fake::FakeGateway;
    use proxyboard_api_types::User;

    #[tokio::test]
    async fn counts_status_and_expiry() {
        let gateway = FakeGateway::new();
        gateway.seed(
            ResourceKind::ProxyHosts,
            vec![
                json!({"id": 1, "domain_names": ["a"], "forward_host": "h", "forward_port": 80}),
                json!({"id": 2, "domain_names": ["b"], "forward_host": "h", "forward_port": 80, "enabled": false}),
                json!({"id": 3, "domain_names": ["c"], "forward_host": "h", "forward_port": 80, "meta": {"nginx_online": false}}),
            ],
        );
        gateway.seed(
            ResourceKind::Certificates,
            vec![
                json!({"id": 4, "provider": "letsencrypt", "domain_names": ["a"], "expires_on": "2025-03-03T00:00:00Z"}),
                json!({"id": 5, "provider": "other", "nice_name": "old", "expires_on": "2025-02-01T00:00:00Z"}),
                json!({"id": 6, "provider": "other", "nice_name": "later", "expires_on": "2026-01-01T00:00:00Z"}),
            ],
        );
        gateway.fail_list(ResourceKind::Streams);
        let admin: User =
            serde_json::from_value(json!({"id": 1, "email": "a@b.c", "roles": ["admin"]}))
                .expect("user");

        let dashboard = load_dashboard(
            &gateway,
            &AccessPolicy::for_user(Some(&admin)),
            &RequestScope::detached(),
            datetime!(2025-03-01 00:00 UTC),
        )
        .await;

        assert_eq!(
            dashboard.counts[&ResourceKind::ProxyHosts],
            ResourceCounts {
                total: 3,
                enabled: 2,
                disabled: 1,
                offline: 1
            }
        );
        assert_eq!(dashboard.expiry.get(&ExpiryBand::Critical), Some(&1));
        assert_eq!(dashboard.expiry.get(&ExpiryBand::Expired), Some(&1));
        assert_eq!(dashboard.expiry.get(&ExpiryBand::Ok), Some(&1));
        assert_eq!(dashboard.urgent_certificates(), 2);
        assert_eq!(dashboard.failed.len(), 1);
        assert!(!dashboard.counts.contains_key(&ResourceKind::Streams));
    }
}
