use serde::{Deserialize, Serialize};

/// Body of `POST /tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identity: String,
    pub secret: String,
}

/// Response of `POST /tokens` and `GET /tokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires: Option<String>,
}

/// Body of `PUT /users/:id/auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    pub secret: String,
}

impl PasswordChangeRequest {
    pub fn password(current: Option<String>, secret: String) -> Self {
        Self {
            kind: "password".to_string(),
            current,
            secret,
        }
    }
}
