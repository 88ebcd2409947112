//! # Error Types
//!
//! Error taxonomy for the secret agent client, built on `thiserror`.
//!
//! Every failure is terminal for the current call: the client performs no
//! automatic retries, and any retry policy belongs to the caller. Callers
//! branch on the variant, never on message text.

use thiserror::Error;

/// Result type for secret agent client operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors surfaced by a `get_secret` call.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Invalid configuration: bad port, unresolvable address, or broken
    /// TLS settings (missing or unparsable CA bundle).
    #[error("Configuration error: {message}")]
    BadConfig { message: String },

    /// The secret path could not be turned into a request (missing
    /// `secrets:` prefix or empty key).
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// No resolved endpoint accepted a connection, or the TLS handshake
    /// was rejected by the peer.
    #[error("Connection failed: {message}")]
    ConnectFailed { message: String },

    /// A readiness poll did not complete within the configured per-step
    /// timeout.
    #[error("Operation timed out: {operation}")]
    Timeout { operation: &'static str },

    /// Transport-level read/write/poll failure, including the peer closing
    /// the connection mid-frame.
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer spoke something other than the expected protocol: wrong
    /// magic, or a declared body length above the accepted maximum.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The response frame was well-formed but its envelope was not usable:
    /// JSON parse failure, missing or empty fields, base64 decode failure,
    /// or an agent-reported error.
    #[error("Bad response: {message}")]
    BadResponse { message: String },
}

impl AgentError {
    /// Create a configuration error.
    pub fn bad_config(message: impl Into<String>) -> Self {
        Self::BadConfig { message: message.into() }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a connection failure error.
    pub fn connect_failed(message: impl Into<String>) -> Self {
        Self::ConnectFailed { message: message.into() }
    }

    /// Create a timeout error for the named blocking step.
    pub fn timeout(operation: &'static str) -> Self {
        Self::Timeout { operation }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create an I/O error for a peer that closed the connection before a
    /// full frame was transferred. Distinct from [`AgentError::Timeout`].
    pub fn peer_closed(context: impl Into<String>) -> Self {
        Self::Io {
            context: context.into(),
            source: std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            ),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol { message: message.into() }
    }

    /// Create a bad response error.
    pub fn bad_response(message: impl Into<String>) -> Self {
        Self::BadResponse { message: message.into() }
    }
}
