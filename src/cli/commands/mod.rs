//! CLI command implementations

pub mod status;
pub mod upload;
pub mod validate;
