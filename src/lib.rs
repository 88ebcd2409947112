//! # Secret Agent Client
//!
//! Resolves secret references of the form `secrets:[<resource>:]<key>` into
//! raw byte values by talking to a remote secret agent over TCP, optionally
//! secured with TLS, using a small length-prefixed binary protocol carrying
//! a JSON payload with a base64-encoded value field.
//!
//! ## Architecture
//!
//! Data flows one way per call:
//!
//! ```text
//! SecretAgentClient → TransportSocket / TlsSession (connect, handshake)
//!                   → protocol codec (framed request / response)
//!                   → envelope decoder (JSON + base64)
//!                   → caller
//! ```
//!
//! - [`transport`]: non-blocking sockets with timeout-bounded readiness
//!   polling, and a manually driven rustls session on top.
//! - [`protocol`]: magic+length framing and the JSON response envelope.
//! - [`client`]: path parsing and per-call orchestration.
//!
//! Each `get_secret` call owns its connection exclusively and tears it down
//! before returning; concurrent calls are independent. The only process-wide
//! shared state is the once-only TLS provider installation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use secret_agent_client::{AgentConfig, SecretAgentClient};
//!
//! #[tokio::main]
//! async fn main() -> secret_agent_client::Result<()> {
//!     let config = AgentConfig {
//!         address: "127.0.0.1".into(),
//!         port: "3005".into(),
//!         ..Default::default()
//!     };
//!
//!     let client = SecretAgentClient::new(config);
//!     let secret = client.get_secret("secrets:pass:pass").await?;
//!     println!("fetched {} bytes", secret.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod protocol;
pub mod transport;

// Re-export commonly used types
pub use client::{SecretAgentClient, SecretPath, SECRETS_PATH_PREFIX};
pub use config::{AgentConfig, TlsOptions};
pub use errors::{AgentError, Result};
pub use observability::init_logging;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
    }
}
