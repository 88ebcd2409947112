//! Response envelope decoding.
//!
//! The response body is a JSON document carrying either an agent-reported
//! `Error` message or a base64-encoded `SecretValue`. Trailing whitespace on
//! the value is tolerated (some agents append a newline); everything else is
//! decoded strictly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::warn;

use crate::errors::{AgentError, Result};

const TRAILING_WHITESPACE: [char; 6] = [' ', '\t', '\n', '\r', '\x0c', '\x0b'];

#[derive(Deserialize)]
struct SecretEnvelope {
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "SecretValue")]
    secret_value: Option<String>,
}

/// Decode a response body into the raw secret bytes.
pub fn decode_secret(body: &[u8]) -> Result<Vec<u8>> {
    let envelope: SecretEnvelope = serde_json::from_slice(body)
        .map_err(|e| AgentError::bad_response(format!("failed to parse response JSON: {e}")))?;

    // An agent that hit an error conveys the reason. Such a response never
    // yields a secret, even if a value field is also present.
    if let Some(message) = envelope.error {
        warn!(agent_error = %message, "secret agent reported an error");
        return Err(AgentError::bad_response(format!("agent error: {message}")));
    }

    let value = envelope
        .secret_value
        .ok_or_else(|| AgentError::bad_response("missing \"SecretValue\" in response"))?;

    if value.is_empty() {
        return Err(AgentError::bad_response("empty secret value"));
    }

    let trimmed = value.trim_end_matches(&TRAILING_WHITESPACE[..]);

    if trimmed.is_empty() {
        return Err(AgentError::bad_response("secret value is only whitespace"));
    }

    // Exact decode target computed up front, plus one spare byte so a
    // caller may append a NUL and treat the secret as a C string.
    let estimated = base64::decoded_len_estimate(trimmed.len());
    let mut secret = Vec::with_capacity(estimated + 1);

    STANDARD
        .decode_vec(trimmed, &mut secret)
        .map_err(|e| AgentError::bad_response(format!("failed to base64-decode secret: {e}")))?;

    debug_assert!(secret.len() <= estimated, "decoded length exceeded computed size");

    Ok(secret)
}
