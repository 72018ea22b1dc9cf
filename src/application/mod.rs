//! Application services built on the domain rules and the API gateway.

pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod search;
pub mod table;
pub mod toggle;
pub mod transfer;
