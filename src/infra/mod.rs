//! Infrastructure adapters: HTTP transport, token storage and telemetry.

pub mod error;
pub mod http;
pub mod telemetry;
pub mod token_store;
