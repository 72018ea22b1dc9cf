use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    domain::error::DomainError,
    infra::{error::InfraError, http::ApiError},
};

/// Flattened error chain for logs and terminal output.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            let message = inner.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            current = inner.source();
        }
        Self { source, messages }
    }

    /// `first: second: third`.
    pub fn joined(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Navigation target implied by the failure, if any.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            AppError::Api(err) => err.redirect(),
            AppError::PermissionDenied(_) => Some("/403"),
            _ => None,
        }
    }

    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Api(ApiError::SessionExpired | ApiError::Unauthorized(_)) => {
                "Session expired, please log in again"
            }
            AppError::Api(ApiError::Forbidden(_)) | AppError::PermissionDenied(_) => {
                "You do not have access to this resource"
            }
            AppError::Api(ApiError::Cancelled) => "Request cancelled",
            AppError::Api(err) if err.is_not_found() => "Resource not found",
            AppError::NotFound => "Resource not found",
            AppError::Domain(DomainError::Validation(_)) | AppError::Validation(_) => {
                "Request could not be processed"
            }
            AppError::Api(_) => "The control-plane API request failed",
            AppError::Infra(InfraError::Configuration { .. }) => "Client misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_) | InfraError::TokenStore { .. }) => {
                "Local storage failure"
            }
            AppError::Domain(DomainError::Invariant { .. }) | AppError::Unexpected(_) => {
                "Unexpected error occurred"
            }
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
