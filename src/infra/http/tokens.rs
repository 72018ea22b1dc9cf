use std::sync::Mutex;

use crate::infra::error::InfraError;

/// Source of the bearer token, injected into [`super::ApiClient`] at construction.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: &str) -> Result<(), InfraError>;
    fn clear(&self) -> Result<(), InfraError>;
}

/// Process-local token holder.
#[derive(Debug, Default)]
pub struct MemoryTokens {
    token: Mutex<Option<String>>,
}

impl MemoryTokens {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

impl TokenProvider for MemoryTokens {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn store(&self, token: &str) -> Result<(), InfraError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| InfraError::token_store("token lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), InfraError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| InfraError::token_store("token lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
