//! # Error Handling
//!
//! Error types for the secret agent client, built on `thiserror`.

pub mod types;

pub use types::{AgentError, Result};
