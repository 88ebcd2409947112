use serde::{Deserialize, Serialize};

use crate::errors::{AgentError, Result};

/// TLS policy for the agent connection.
///
/// The CA bundle is a PEM string (zero or more certificates), not a file
/// path, so callers can source it from wherever their own configuration
/// lives. When TLS is enabled a bundle is required; the client does not
/// fall back to system roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsOptions {
    /// Whether to wrap the connection in TLS.
    pub enabled: bool,

    /// PEM-encoded CA certificate bundle used to verify the agent.
    pub ca_bundle: Option<String>,
}

impl TlsOptions {
    /// Load TLS options from `SECRET_AGENT_TLS_ENABLED` and
    /// `SECRET_AGENT_TLS_CA_FILE` environment variables.
    pub fn from_env() -> Result<Self> {
        let enabled = std::env::var("SECRET_AGENT_TLS_ENABLED")
            .ok()
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        if !enabled {
            return Ok(Self::default());
        }

        let ca_path = std::env::var("SECRET_AGENT_TLS_CA_FILE").map_err(|_| {
            AgentError::bad_config("TLS is enabled but SECRET_AGENT_TLS_CA_FILE is not set")
        })?;

        let ca_bundle = std::fs::read_to_string(ca_path.trim())
            .map_err(|e| AgentError::bad_config(format!("failed to read CA bundle: {e}")))?;

        Ok(Self { enabled: true, ca_bundle: Some(ca_bundle) })
    }

    /// Validate that the options are internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.ca_bundle.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AgentError::bad_config("TLS is enabled but no CA bundle was provided"));
        }
        Ok(())
    }
}
