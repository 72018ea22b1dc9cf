//! Client-side index over every resource the user may view.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::histogram;
use proxyboard_api_types::{ResourceKind, ResourceRecord};
use serde::Serialize;
use tracing::{debug, warn};

use crate::application::gateway::ResourceGateway;
use crate::application::table::status_label;
use crate::domain::access::AccessSummary;
use crate::domain::permissions::AccessPolicy;
use crate::domain::visibility::VisibilityFilter;
use crate::infra::http::RequestScope;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: i64,
    pub kind: ResourceKind,
    pub title: String,
    pub subtitle: String,
    pub metadata: Vec<(&'static str, String)>,
    #[serde(skip)]
    pub resource: ResourceRecord,
}

impl SearchResult {
    fn from_record(record: ResourceRecord) -> Self {
        let (title, subtitle) = match &record {
            ResourceRecord::ProxyHost(r) => (r.domain_names.join(", "), r.forward_target()),
            ResourceRecord::RedirectionHost(r) => (
                r.domain_names.join(", "),
                format!("redirects to {}", r.forward_domain_name),
            ),
            ResourceRecord::DeadHost(r) => (r.domain_names.join(", "), "404 host".to_string()),
            ResourceRecord::Stream(r) => (
                format!("port {}", r.incoming_port),
                format!("{}:{}", r.forwarding_host, r.forwarding_port),
            ),
            ResourceRecord::AccessList(r) => (r.name.clone(), AccessSummary::of(r).describe()),
            ResourceRecord::Certificate(r) => (
                r.display_name(),
                format!("{} {}", r.provider.display_name(), r.domain_names.join(", ")),
            ),
        };

        let mut metadata = Vec::new();
        if record.enabled().is_some() {
            metadata.push(("status", status_label(&record).to_string()));
        }

        Self {
            id: record.id(),
            kind: record.kind(),
            title,
            subtitle,
            metadata,
            resource: record,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        format!("{} {}", self.title, self.subtitle)
            .to_lowercase()
            .contains(needle)
    }

    /// Where selecting the result navigates to.
    pub fn route(&self) -> String {
        format!("/{}/{}", self.kind.as_str(), self.id)
    }
}

/// Quick-create shortcut for a resource the user can manage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchAction {
    pub kind: ResourceKind,
    pub label: String,
    pub route: String,
    pub command: String,
}

impl SearchAction {
    fn create(kind: ResourceKind) -> Self {
        Self {
            kind,
            label: format!("Create {}", kind.singular()),
            route: format!("/{}/new", kind.as_str()),
            command: format!("proxyboard {} create", kind.as_str()),
        }
    }
}

/// Outcome of one preload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// `false` when the cache was still fresh and nothing was fetched.
    pub fetched: bool,
    pub loaded: Vec<(ResourceKind, usize)>,
    pub failed: Vec<(ResourceKind, String)>,
}

#[derive(Debug)]
struct SearchCache {
    loaded_at: Instant,
    results: Vec<SearchResult>,
}

pub struct GlobalSearch {
    gateway: Arc<dyn ResourceGateway>,
    policy: AccessPolicy,
    ttl: Duration,
    cache: Option<SearchCache>,
}

impl GlobalSearch {
    pub fn new(gateway: Arc<dyn ResourceGateway>, policy: AccessPolicy, ttl: Duration) -> Self {
        Self {
            gateway,
            policy,
            ttl,
            cache: None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.loaded_at.elapsed() < self.ttl)
    }

    /// Fetches every viewable core resource concurrently unless the cache is fresh.
    ///
    /// A failed resource is logged and indexed as empty; it never fails the pass.
    pub async fn preload(&mut self, force: bool, scope: &RequestScope) -> PreloadReport {
        if !force && self.is_fresh() {
            debug!("search cache fresh, skipping preload");
            return PreloadReport::default();
        }

        let started = Instant::now();
        let kinds: Vec<ResourceKind> = ResourceKind::CORE
            .into_iter()
            .filter(|kind| self.policy.can_view(*kind))
            .collect();
        let gateway = &self.gateway;
        let fetches = kinds
            .iter()
            .map(|kind| async move { (*kind, gateway.list(*kind, scope).await) });
        let settled = join_all(fetches).await;

        let visibility = VisibilityFilter::new(&self.policy);
        let mut report = PreloadReport {
            fetched: true,
            ..PreloadReport::default()
        };
        let mut results = Vec::new();
        for (kind, outcome) in settled {
            match outcome {
                Ok(records) => {
                    let records = visibility.filter(records);
                    report.loaded.push((kind, records.len()));
                    results.extend(records.into_iter().map(SearchResult::from_record));
                }
                Err(err) => {
                    warn!(resource = %kind, error = %err, "search preload failed for resource");
                    report.loaded.push((kind, 0));
                    report.failed.push((kind, err.to_string()));
                }
            }
        }

        histogram!("proxyboard_search_preload_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        self.cache = Some(SearchCache {
            loaded_at: Instant::now(),
            results,
        });
        report
    }

    /// Case-insensitive substring match over title and subtitle. No I/O.
    pub fn results(&self, query: &str) -> Vec<&SearchResult> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.cache
            .iter()
            .flat_map(|cache| cache.results.iter())
            .filter(|result| result.matches(&needle))
            .collect()
    }

    pub fn quick_actions(&self, query: &str) -> Vec<SearchAction> {
        let needle = query.trim().to_lowercase();
        self.policy
            .manageable_resources()
            .into_iter()
            .map(SearchAction::create)
            .filter(|action| needle.is_empty() || action.label.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn indexed(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.results.len())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::gateway::fake::FakeGateway;
    use proxyboard_api_types::User;

    fn admin() -> AccessPolicy {
        let user: User = serde_json::from_value(json!({
            "id": 1, "email": "admin@example.com", "name": "Admin", "roles": ["admin"]
        }))
        .expect("user");
        AccessPolicy::for_user(Some(&user))
    }

    fn seeded() -> Arc<FakeGateway> {
        let gateway = FakeGateway::new();
        gateway.seed(
            ResourceKind::ProxyHosts,
            vec![json!({"id": 1, "domain_names": ["app.example.com"], "forward_host": "10.0.0.5", "forward_port": 8080})],
        );
        gateway.seed(
            ResourceKind::Streams,
            vec![json!({"id": 2, "incoming_port": 2222, "forwarding_host": "git.internal", "forwarding_port": 22})],
        );
        Arc::new(gateway)
    }

    #[tokio::test]
    async fn failed_resource_degrades_to_empty() {
        let gateway = seeded();
        gateway.fail_list(ResourceKind::Certificates);
        let mut search = GlobalSearch::new(gateway.clone(), admin(), DEFAULT_TTL);

        let report = search.preload(false, &RequestScope::detached()).await;
        assert!(report.fetched);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, ResourceKind::Certificates);
        assert_eq!(search.indexed(), 2);
        assert_eq!(gateway.list_calls(), 6);
    }

    #[tokio::test]
    async fn fresh_cache_skips_network() {
        let gateway = seeded();
        let mut search = GlobalSearch::new(gateway.clone(), admin(), DEFAULT_TTL);
        search.preload(false, &RequestScope::detached()).await;
        let report = search.preload(false, &RequestScope::detached()).await;
        assert!(!report.fetched);
        assert_eq!(gateway.list_calls(), 6);

        search.preload(true, &RequestScope::detached()).await;
        assert_eq!(gateway.list_calls(), 12);

        search.invalidate();
        assert!(!search.is_fresh());
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let gateway = seeded();
        let mut search = GlobalSearch::new(gateway.clone(), admin(), Duration::ZERO);
        search.preload(false, &RequestScope::detached()).await;
        search.preload(false, &RequestScope::detached()).await;
        assert_eq!(gateway.list_calls(), 12);
    }

    #[tokio::test]
    async fn results_match_title_and_subtitle() {
        let mut search = GlobalSearch::new(seeded(), admin(), DEFAULT_TTL);
        search.preload(false, &RequestScope::detached()).await;

        assert!(search.results("").is_empty());
        assert_eq!(search.results("APP.example")[0].id, 1);
        assert_eq!(search.results("git.internal")[0].kind, ResourceKind::Streams);
        assert!(search.results("no such host").is_empty());
        assert_eq!(search.results("app")[0].route(), "/proxy-hosts/1");
    }

    #[tokio::test]
    async fn quick_actions_follow_manage_permission() {
        let user: User = serde_json::from_value(json!({
            "id": 5, "email": "ops@example.com", "name": "Ops", "roles": [],
            "permissions": {"visibility": "user", "proxy_hosts": "manage", "streams": "view"}
        }))
        .expect("user");
        let search = GlobalSearch::new(seeded(), AccessPolicy::for_user(Some(&user)), DEFAULT_TTL);

        let actions = search.quick_actions("");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ResourceKind::ProxyHosts);
        assert!(search.quick_actions("stream").is_empty());
    }

    #[tokio::test]
    async fn user_scope_hides_foreign_rows() {
        let gateway = FakeGateway::new();
        gateway.seed(
            ResourceKind::ProxyHosts,
            vec![
                json!({"id": 1, "owner_user_id": 5, "domain_names": ["mine.example.com"], "forward_host": "a", "forward_port": 80}),
                json!({"id": 2, "owner_user_id": 6, "domain_names": ["theirs.example.com"], "forward_host": "b", "forward_port": 80}),
            ],
        );
        let user: User = serde_json::from_value(json!({
            "id": 5, "email": "ops@example.com", "name": "Ops", "roles": [],
            "permissions": {"visibility": "user", "proxy_hosts": "view"}
        }))
        .expect("user");
        let mut search =
            GlobalSearch::new(Arc::new(gateway), AccessPolicy::for_user(Some(&user)), DEFAULT_TTL);
        search.preload(false, &RequestScope::detached()).await;
        let titles: Vec<_> = search
            .results("example.com")
            .into_iter()
            .map(|r| r.title.clone())
            .collect();
        assert_eq!(titles, vec!["mine.example.com"]);
    }
}
