//! # Configuration Management
//!
//! Configuration structures for the secret agent client: the endpoint and
//! timeout settings plus the TLS policy, with `SECRET_AGENT_*` environment
//! variable loading for callers that want it.

pub mod settings;
pub mod tls;

pub use settings::{AgentConfig, MAX_PORT, MIN_PORT};
pub use tls::TlsOptions;
