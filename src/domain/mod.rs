//! Domain rules evaluated entirely on the client.

pub mod access;
pub mod certificates;
pub mod error;
pub mod permissions;
pub mod validation;
pub mod visibility;
