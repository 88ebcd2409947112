//! # Configuration Settings
//!
//! Configuration consumed by the secret agent client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TlsOptions;
use crate::errors::{AgentError, Result};

/// Lowest port accepted for the agent endpoint.
pub const MIN_PORT: u16 = 1;

/// Highest port accepted for the agent endpoint.
pub const MAX_PORT: u16 = 65535;

/// Connection settings for the secret agent.
///
/// The port is carried as a string and parsed at validation/connect time,
/// matching the shape of the configuration surface this client plugs into.
/// The timeout applies to each blocking step (connect attempt, readiness
/// poll during handshake, read, write) independently; it is not an overall
/// deadline for one `get_secret` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hostname or IP address of the secret agent.
    pub address: String,

    /// Port the secret agent listens on, parsed as an integer in 1-65535.
    pub port: String,

    /// Per-step timeout in milliseconds.
    pub timeout_ms: u64,

    /// TLS policy for the connection.
    pub tls: TlsOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: "3005".to_string(),
            timeout_ms: 1000,
            tls: TlsOptions::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from `SECRET_AGENT_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timeout_ms = match std::env::var("SECRET_AGENT_TIMEOUT_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                AgentError::bad_config(format!("invalid SECRET_AGENT_TIMEOUT_MS: {raw}"))
            })?,
            Err(_) => defaults.timeout_ms,
        };

        Ok(Self {
            address: std::env::var("SECRET_AGENT_ADDR").unwrap_or(defaults.address),
            port: std::env::var("SECRET_AGENT_PORT").unwrap_or(defaults.port),
            timeout_ms,
            tls: TlsOptions::from_env()?,
        })
    }

    /// Per-step timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse and range-check the configured port.
    pub fn port_number(&self) -> Result<u16> {
        let port: u16 = self.port.trim().parse().map_err(|_| {
            AgentError::bad_config(format!("port {:?} is not a valid integer", self.port))
        })?;

        if port < MIN_PORT {
            return Err(AgentError::bad_config(format!(
                "port {port} is outside the valid port range {MIN_PORT}-{MAX_PORT}"
            )));
        }

        Ok(port)
    }

    /// Validate the configuration without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(AgentError::bad_config("agent address cannot be empty"));
        }

        self.port_number()?;
        self.tls.validate()?;

        Ok(())
    }
}
