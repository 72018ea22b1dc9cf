use async_trait::async_trait;
use proxyboard_api_types::{RecordError, ResourceKind, ResourceRecord};
use reqwest::Method;
use serde_json::Value;
use tracing::warn;

use super::{ApiClient, ApiError, RequestScope};
use crate::application::gateway::ResourceGateway;

fn expand_query(kind: ResourceKind) -> Vec<(&'static str, String)> {
    let expand = kind.default_expand();
    if expand.is_empty() {
        Vec::new()
    } else {
        vec![("expand", expand.join(","))]
    }
}

fn item_path(kind: ResourceKind, id: i64) -> String {
    format!("{}/{id}", kind.path())
}

#[async_trait]
impl ResourceGateway for ApiClient {
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &RequestScope,
    ) -> Result<Vec<ResourceRecord>, ApiError> {
        let raw: Vec<Value> = self
            .get_json(kind.path(), &expand_query(kind), scope)
            .await?;
        // A row that fails to decode is dropped; the rest of the list still loads.
        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match ResourceRecord::from_value(kind, value) {
                Ok(record) => records.push(record),
                Err(err @ RecordError::UnsupportedKind(_)) => return Err(err.into()),
                Err(err) => warn!(resource = %kind, error = %err, "skipping undecodable row"),
            }
        }
        Ok(records)
    }

    async fn get(
        &self,
        kind: ResourceKind,
        id: i64,
        scope: &RequestScope,
    ) -> Result<ResourceRecord, ApiError> {
        let raw: Value = self
            .get_json(&item_path(kind, id), &expand_query(kind), scope)
            .await?;
        Ok(ResourceRecord::from_value(kind, raw)?)
    }

    async fn create(
        &self,
        kind: ResourceKind,
        body: Value,
        scope: &RequestScope,
    ) -> Result<ResourceRecord, ApiError> {
        let raw: Value = self
            .send_json(Method::POST, kind.path(), &[], Some(body), scope)
            .await?;
        Ok(ResourceRecord::from_value(kind, raw)?)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: i64,
        body: Value,
        scope: &RequestScope,
    ) -> Result<ResourceRecord, ApiError> {
        let raw: Value = self
            .send_json(Method::PUT, &item_path(kind, id), &[], Some(body), scope)
            .await?;
        Ok(ResourceRecord::from_value(kind, raw)?)
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        id: i64,
        scope: &RequestScope,
    ) -> Result<(), ApiError> {
        self.send_unit(Method::DELETE, &item_path(kind, id), None, scope)
            .await
    }

    async fn set_enabled(
        &self,
        kind: ResourceKind,
        id: i64,
        enabled: bool,
        scope: &RequestScope,
    ) -> Result<(), ApiError> {
        let action = if enabled { "enable" } else { "disable" };
        self.send_unit(
            Method::POST,
            &format!("{}/{action}", item_path(kind, id)),
            None,
            scope,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use httpmock::MockServer;
    use serde_json::json;

    use super::*;
    use crate::infra::http::MemoryTokens;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(
            &server.url("/api"),
            Duration::from_secs(5),
            Arc::new(MemoryTokens::new(Some("tok".to_string()))),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn list_accepts_sql_timestamps() {
        let server = MockServer::start();
        let streams = server.mock(|when, then| {
            when.method("GET").path("/api/nginx/streams");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{
                    "id": 1,
                    "created_on": "2024-01-10 12:00:00",
                    "modified_on": "2024-01-10 12:00:00",
                    "incoming_port": 2222,
                    "forwarding_host": "10.0.0.10",
                    "forwarding_port": 22
                }]));
        });

        let records = client(&server)
            .list(ResourceKind::Streams, &RequestScope::detached())
            .await
            .expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), 1);
        streams.assert();
    }

    #[tokio::test]
    async fn list_skips_rows_that_fail_to_decode() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/nginx/dead-hosts");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"id": 1, "created_on": "2024-03-01T10:00:00Z", "domain_names": ["a.example.com"]},
                    {"id": 2, "created_on": "last tuesday", "domain_names": ["b.example.com"]},
                    {"id": 3, "domain_names": ["c.example.com"]}
                ]));
        });

        let records = client(&server)
            .list(ResourceKind::DeadHosts, &RequestScope::detached())
            .await
            .expect("list");
        let ids: Vec<i64> = records.iter().map(ResourceRecord::id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn users_are_not_listed_as_records() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/users");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{"id": 1, "email": "a@example.com"}]));
        });

        let err = client(&server)
            .list(ResourceKind::Users, &RequestScope::detached())
            .await
            .expect_err("unsupported");
        assert!(matches!(
            err,
            ApiError::Record(RecordError::UnsupportedKind(ResourceKind::Users))
        ));
    }
}
