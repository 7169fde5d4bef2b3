//! CLI command implementations.

pub mod agents;
pub mod orchestrate;
pub mod text;
