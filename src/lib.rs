//! Client library for a reverse-proxy manager's control-plane API.
//!
//! `domain` holds the pure permission, visibility and validation rules,
//! `application` the table engine, global search, import/export and the
//! dashboard, and `infra` the HTTP transport, token storage and telemetry.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
