#![deny(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use proxyboard::application::error::AppError;
use proxyboard::application::gateway::ResourceGateway;
use proxyboard::application::transfer::TransferError;
use proxyboard::config::{LoadError, Settings};
use proxyboard::domain::permissions::AccessPolicy;
use proxyboard::domain::validation::FieldErrors;
use proxyboard::infra::error::InfraError;
use proxyboard::infra::http::{ApiClient, ApiError, RequestScope, ScopeHandle, TokenProvider};
use proxyboard::infra::token_store::FileTokenStore;
use proxyboard_api_types::ResourceKind;
use thiserror::Error;
use time::OffsetDateTime;

const DEFAULT_WIDTH: u16 = 120;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write output file {path}: {source}")]
    OutputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to render output: {0}")]
    Render(String),
    #[error("{failed} of {total} items failed")]
    Partial { failed: usize, total: usize },
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::App(AppError::Api(err))
    }
}

impl From<FieldErrors> for CliError {
    fn from(errors: FieldErrors) -> Self {
        Self::App(AppError::Domain(errors.into()))
    }
}

impl CliError {
    /// Where the operator should go next, mirroring the console's redirects.
    pub fn hint(&self) -> Option<&'static str> {
        let CliError::App(err) = self else {
            return None;
        };
        match err.redirect()? {
            "/login" => Some("run `proxyboard login` to start a new session"),
            "/403" => Some("ask an administrator for access to this resource"),
            _ => None,
        }
    }
}

/// Everything a handler needs: resolved settings, the API client and the
/// scope that owns this invocation's requests.
pub struct Ctx {
    pub settings: Settings,
    pub api: ApiClient,
    handle: ScopeHandle,
}

impl Ctx {
    pub fn new(settings: Settings, tokens: Arc<dyn TokenProvider>) -> Result<Self, CliError> {
        let api = ApiClient::new(settings.api.base_url.as_str(), settings.api.timeout, tokens)?;
        Ok(Self {
            settings,
            api,
            handle: ScopeHandle::new(),
        })
    }

    pub fn scope(&self) -> RequestScope {
        self.handle.scope()
    }

    pub fn gateway(&self) -> Arc<dyn ResourceGateway> {
        Arc::new(self.api.clone())
    }

    /// Loads the signed-in user and derives the effective policy.
    pub async fn policy(&self) -> Result<AccessPolicy, CliError> {
        let user = self.api.me(&self.scope()).await?;
        Ok(AccessPolicy::for_user(Some(&user)))
    }

    pub async fn require_view(&self, kind: ResourceKind) -> Result<AccessPolicy, CliError> {
        let policy = self.policy().await?;
        if !policy.can_view(kind) {
            return Err(AppError::permission_denied(format!(
                "you cannot view {}",
                kind.display_name().to_lowercase()
            ))
            .into());
        }
        Ok(policy)
    }

    pub async fn require_manage(&self, kind: ResourceKind) -> Result<AccessPolicy, CliError> {
        let policy = self.policy().await?;
        if !policy.can_manage(kind) {
            return Err(AppError::permission_denied(format!(
                "you cannot manage {}",
                kind.display_name().to_lowercase()
            ))
            .into());
        }
        Ok(policy)
    }

    pub async fn require_admin(&self) -> Result<AccessPolicy, CliError> {
        let policy = self.policy().await?;
        if !policy.is_admin() {
            return Err(AppError::permission_denied("user administration requires admin").into());
        }
        Ok(policy)
    }

    /// Layout width: configured value, then `COLUMNS`, then a default.
    pub fn width(&self) -> u16 {
        self.settings.table.width.unwrap_or_else(|| {
            std::env::var("COLUMNS")
                .ok()
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_WIDTH)
        })
    }

    pub fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub fn build_ctx(settings: Settings) -> Result<Ctx, CliError> {
    let store = FileTokenStore::open(settings.session.token_file.clone())?;
    Ctx::new(settings, Arc::new(store))
}
