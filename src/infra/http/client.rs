use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use proxyboard_api_types::{
    AuditLogEntry, LoginRequest, PasswordChangeRequest, Setting, TokenResponse, User,
    UserPermissions,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, RequestScope, TokenProvider, normalize_error_message};

const TOKENS_PATH: &str = "tokens";

#[derive(Debug, Clone)]
struct RequestSpec {
    method: Method,
    url: Url,
    body: Option<Value>,
    /// Login calls never trigger a refresh.
    is_login: bool,
}

/// Authenticated client for the control-plane API.
///
/// Every request carries the provider's bearer token. A 401 on a request made
/// with a token triggers one silent refresh and one retry; a second 401 or a
/// failed refresh clears the stored token.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base, tokens })
    }

    pub fn user_agent() -> &'static str {
        concat!("proxyboard/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        scope: &RequestScope,
    ) -> Result<T, ApiError> {
        self.send_json(Method::GET, path, query, None, scope).await
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        scope: &RequestScope,
    ) -> Result<T, ApiError> {
        let spec = RequestSpec {
            method,
            url: self.url(path, query)?,
            body,
            is_login: false,
        };
        let bytes = self.dispatch(&spec, scope).await?;
        decode(&bytes)
    }

    /// Sends a request whose response body is irrelevant.
    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        scope: &RequestScope,
    ) -> Result<(), ApiError> {
        let spec = RequestSpec {
            method,
            url: self.url(path, &[])?,
            body,
            is_login: false,
        };
        self.dispatch(&spec, scope).await.map(|_| ())
    }

    async fn dispatch(&self, spec: &RequestSpec, scope: &RequestScope) -> Result<Vec<u8>, ApiError> {
        let token = self.tokens.token();
        let (status, body) = self.execute(spec, token.as_deref(), scope).await?;

        if status != StatusCode::UNAUTHORIZED || spec.is_login {
            return interpret(status, body);
        }
        let Some(stale) = token else {
            return interpret(status, body);
        };

        let fresh = match self.refresh(&stale, scope).await {
            Ok(fresh) => fresh,
            Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing session");
                self.end_session();
                return Err(ApiError::SessionExpired);
            }
        };

        let (status, body) = self.execute(spec, Some(&fresh), scope).await?;
        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %spec.url, "request rejected after token refresh, clearing session");
            self.end_session();
            return Err(ApiError::SessionExpired);
        }
        interpret(status, body)
    }

    async fn execute(
        &self,
        spec: &RequestSpec,
        token: Option<&str>,
        scope: &RequestScope,
    ) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let mut request = self.http.request(spec.method.clone(), spec.url.clone());
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let result = scope
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                let bytes = response.bytes().await?;
                Ok::<_, ApiError>((status, bytes.to_vec()))
            })
            .await;

        if let Ok((status, _)) = &result {
            debug!(method = %spec.method, url = %spec.url, status = status.as_u16(), "api request");
            counter!(
                "proxyboard_api_requests_total",
                "method" => spec.method.to_string(),
                "status" => status.as_u16().to_string()
            )
            .increment(1);
        }
        result
    }

    async fn refresh(&self, stale: &str, scope: &RequestScope) -> Result<String, ApiError> {
        counter!("proxyboard_token_refresh_total").increment(1);
        let spec = RequestSpec {
            method: Method::GET,
            url: self.url(TOKENS_PATH, &[])?,
            body: None,
            is_login: true,
        };
        let (status, body) = self.execute(&spec, Some(stale), scope).await?;
        let response: TokenResponse = decode(&interpret(status, body)?)?;
        if let Err(err) = self.tokens.store(&response.token) {
            warn!(error = %err, "failed to persist refreshed token");
        }
        Ok(response.token)
    }

    fn end_session(&self) {
        if let Err(err) = self.tokens.clear() {
            warn!(error = %err, "failed to clear stored token");
        }
    }

    /// `POST /tokens`; stores the issued token on success.
    pub async fn login(
        &self,
        identity: &str,
        secret: &str,
        scope: &RequestScope,
    ) -> Result<TokenResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            identity: identity.to_string(),
            secret: secret.to_string(),
        })
        .map_err(|err| ApiError::Decode(err.to_string()))?;
        let spec = RequestSpec {
            method: Method::POST,
            url: self.url(TOKENS_PATH, &[])?,
            body: Some(body),
            is_login: true,
        };
        let (status, bytes) = self.execute(&spec, None, scope).await?;
        let response: TokenResponse = decode(&interpret(status, bytes)?)?;
        self.tokens.store(&response.token)?;
        Ok(response)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.tokens.clear()?;
        Ok(())
    }

    /// `GET /users/me?expand=permissions`.
    pub async fn me(&self, scope: &RequestScope) -> Result<User, ApiError> {
        self.get_json(
            "users/me",
            &[("expand", "permissions".to_string())],
            scope,
        )
        .await
    }

    pub async fn list_users(&self, scope: &RequestScope) -> Result<Vec<User>, ApiError> {
        self.get_json("users", &[("expand", "permissions".to_string())], scope)
            .await
    }

    pub async fn get_user(&self, id: i64, scope: &RequestScope) -> Result<User, ApiError> {
        self.get_json(
            &format!("users/{id}"),
            &[("expand", "permissions".to_string())],
            scope,
        )
        .await
    }

    pub async fn create_user(&self, body: Value, scope: &RequestScope) -> Result<User, ApiError> {
        self.send_json(Method::POST, "users", &[], Some(body), scope)
            .await
    }

    pub async fn update_user(
        &self,
        id: i64,
        body: Value,
        scope: &RequestScope,
    ) -> Result<User, ApiError> {
        self.send_json(Method::PUT, &format!("users/{id}"), &[], Some(body), scope)
            .await
    }

    pub async fn delete_user(&self, id: i64, scope: &RequestScope) -> Result<(), ApiError> {
        self.send_unit(Method::DELETE, &format!("users/{id}"), None, scope)
            .await
    }

    pub async fn set_password(
        &self,
        id: i64,
        change: PasswordChangeRequest,
        scope: &RequestScope,
    ) -> Result<(), ApiError> {
        let body =
            serde_json::to_value(change).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.send_unit(Method::PUT, &format!("users/{id}/auth"), Some(body), scope)
            .await
    }

    pub async fn set_permissions(
        &self,
        id: i64,
        permissions: &UserPermissions,
        scope: &RequestScope,
    ) -> Result<(), ApiError> {
        let body =
            serde_json::to_value(permissions).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.send_unit(
            Method::PUT,
            &format!("users/{id}/permissions"),
            Some(body),
            scope,
        )
        .await
    }

    /// `POST /users/:id/login`: a token acting as that user.
    pub async fn login_as(&self, id: i64, scope: &RequestScope) -> Result<TokenResponse, ApiError> {
        self.send_json(Method::POST, &format!("users/{id}/login"), &[], None, scope)
            .await
    }

    pub async fn list_settings(&self, scope: &RequestScope) -> Result<Vec<Setting>, ApiError> {
        self.get_json("settings", &[], scope).await
    }

    pub async fn get_setting(&self, id: &str, scope: &RequestScope) -> Result<Setting, ApiError> {
        self.get_json(&format!("settings/{id}"), &[], scope).await
    }

    pub async fn update_setting(
        &self,
        id: &str,
        body: Value,
        scope: &RequestScope,
    ) -> Result<Setting, ApiError> {
        self.send_json(Method::PUT, &format!("settings/{id}"), &[], Some(body), scope)
            .await
    }

    pub async fn renew_certificate(&self, id: i64, scope: &RequestScope) -> Result<(), ApiError> {
        self.send_unit(
            Method::POST,
            &format!("nginx/certificates/{id}/renew"),
            None,
            scope,
        )
        .await
    }

    pub async fn audit_log(&self, scope: &RequestScope) -> Result<Vec<AuditLogEntry>, ApiError> {
        self.get_json("audit-log", &[("expand", "user".to_string())], scope)
            .await
    }
}

fn interpret(status: StatusCode, body: Vec<u8>) -> Result<Vec<u8>, ApiError> {
    if status.is_success() {
        return Ok(body);
    }
    let fallback = status.canonical_reason().unwrap_or_default();
    let message = normalize_error_message(&body, fallback);
    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|err| ApiError::Decode(err.to_string()))
}
