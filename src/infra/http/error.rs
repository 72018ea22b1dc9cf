use proxyboard_api_types::RecordError;
use serde_json::Value;
use thiserror::Error;

use crate::infra::error::InfraError;

const FALLBACK_MESSAGE: &str = "Unexpected error from the API";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    #[error("not signed in: {0}")]
    Unauthorized(String),
    #[error("session expired, sign in again")]
    SessionExpired,
    #[error("permission denied: {0}")]
    Forbidden(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl From<reqwest::Error> for ApiError {
    fn from(source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            "could not connect to the API".to_string()
        } else {
            source.to_string()
        };
        Self::Transport { message, source }
    }
}

impl ApiError {
    /// Where an interactive front end should send the user next.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::SessionExpired => Some("/login"),
            Self::Forbidden(_) => Some("/403"),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) | Self::SessionExpired => Some(401),
            Self::Forbidden(_) => Some(403),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Single human-readable message for a failed response.
///
/// Looks at `error.message`, then `message`, then the fallback.
pub fn normalize_error_message(body: &[u8], fallback: &str) -> String {
    let parsed = serde_json::from_slice::<Value>(body).ok();
    let from_body = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| value.get("message").and_then(Value::as_str))
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    });

    from_body.unwrap_or_else(|| {
        if fallback.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            fallback.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_nested_error_message() {
        let body = br#"{"error":{"code":400,"message":"Domain already in use"},"message":"outer"}"#;
        assert_eq!(
            normalize_error_message(body, "Bad Request"),
            "Domain already in use"
        );
    }

    #[test]
    fn falls_back_to_top_level_message() {
        let body = br#"{"message":"Not Found"}"#;
        assert_eq!(normalize_error_message(body, "fallback"), "Not Found");
    }

    #[test]
    fn non_json_body_uses_fallback() {
        assert_eq!(normalize_error_message(b"<html>", "Bad Gateway"), "Bad Gateway");
        assert_eq!(normalize_error_message(b"", ""), FALLBACK_MESSAGE);
    }

    #[test]
    fn redirect_targets() {
        assert_eq!(ApiError::SessionExpired.redirect(), Some("/login"));
        assert_eq!(ApiError::Forbidden("no".into()).redirect(), Some("/403"));
        assert_eq!(ApiError::Cancelled.redirect(), None);
    }
}
