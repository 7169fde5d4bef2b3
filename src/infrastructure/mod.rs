//! Infrastructure layer module
//!
//! This module contains the adapters and utilities around external systems:
//! - Chat-completion client, SSE parsing, retry and rate limiting
//! - Prompt templating
//! - Response validation
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod llm;
pub mod logging;
pub mod templates;
pub mod validators;
