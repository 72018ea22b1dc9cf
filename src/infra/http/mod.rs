//! Client side of the control-plane REST API.

mod client;
mod error;
mod gateway;
mod scope;
mod tokens;

pub use client::ApiClient;
pub use error::{ApiError, normalize_error_message};
pub use scope::{RequestScope, ScopeHandle};
pub use tokens::{MemoryTokens, TokenProvider};
