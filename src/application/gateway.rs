//! Port through which services reach the control-plane API.

use async_trait::async_trait;
use proxyboard_api_types::{ResourceKind, ResourceRecord};
use serde_json::Value;

use crate::infra::http::{ApiError, RequestScope};

/// CRUD over the six core resources.
///
/// Implemented by [`crate::infra::http::ApiClient`]; services depend on
/// `Arc<dyn ResourceGateway>` so tests can swap in an in-memory fake.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &RequestScope,
    ) -> Result<Vec<ResourceRecord>, ApiError>;

    async fn get(
        &self,
        kind: ResourceKind,
        id: i64,
        scope: &RequestScope,
    ) -> Result<ResourceRecord, ApiError>;

    async fn create(
        &self,
        kind: ResourceKind,
        body: Value,
        scope: &RequestScope,
    ) -> Result<ResourceRecord, ApiError>;

    async fn update(
        &self,
        kind: ResourceKind,
        id: i64,
        body: Value,
        scope: &RequestScope,
    ) -> Result<ResourceRecord, ApiError>;

    async fn delete(&self, kind: ResourceKind, id: i64, scope: &RequestScope)
    -> Result<(), ApiError>;

    async fn set_enabled(
        &self,
        kind: ResourceKind,
        id: i64,
        enabled: bool,
        scope: &RequestScope,
    ) -> Result<(), ApiError>;
}
