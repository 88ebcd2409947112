//! # Secret Client
//!
//! Path parsing and the one-call orchestration: parse, connect, optional TLS
//! handshake, protocol round trip, envelope decode. Every call owns its own
//! connection and buffers; the connection is torn down unconditionally
//! before the call returns, on success and failure alike.

use tracing::{debug, instrument};

use crate::config::AgentConfig;
use crate::errors::{AgentError, Result};
use crate::protocol;
use crate::transport::{Connection, TlsSession, TransportSocket};

/// Prefix identifying a secret reference.
pub const SECRETS_PATH_PREFIX: &str = "secrets:";

/// A parsed secret path: `secrets:[<resource>:]<key>`.
///
/// Both fields borrow from the original path string. The key is the last
/// `:`-delimited segment and is never empty; everything between the prefix
/// and the last `:` (if anything) is the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretPath<'a> {
    /// Optional namespace qualifier preceding the key.
    pub resource: Option<&'a str>,
    /// The secret key, always non-empty.
    pub key: &'a str,
}

impl<'a> SecretPath<'a> {
    /// Parse a secret reference.
    ///
    /// An empty key is a request-construction error and is rejected here,
    /// before anything touches the wire. An empty resource segment
    /// (`secrets::key`) is treated as no resource at all.
    pub fn parse(path: &'a str) -> Result<Self> {
        let suffix = path.strip_prefix(SECRETS_PATH_PREFIX).ok_or_else(|| {
            AgentError::bad_request(format!("path does not start with {SECRETS_PATH_PREFIX:?}"))
        })?;

        if suffix.is_empty() {
            return Err(AgentError::bad_request("empty secret key"));
        }

        match suffix.rsplit_once(':') {
            Some((_, "")) => Err(AgentError::bad_request("empty secret key")),
            Some(("", key)) => Ok(Self { resource: None, key }),
            Some((resource, key)) => Ok(Self { resource: Some(resource), key }),
            None => Ok(Self { resource: None, key: suffix }),
        }
    }
}

/// Client for fetching secrets from a secret agent.
///
/// The client is cheap to clone and holds no connection state; each
/// [`get_secret`](Self::get_secret) call dials the agent, performs one
/// request/response exchange, and releases the connection. Concurrent calls
/// are independent.
#[derive(Debug, Clone)]
pub struct SecretAgentClient {
    config: AgentConfig,
}

impl SecretAgentClient {
    /// Create a client over the given configuration.
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Resolve a secret reference into its raw byte value.
    ///
    /// All failures are terminal for the call; there are no automatic
    /// retries. A timeout leaves no connection behind to reuse.
    #[instrument(skip(self), fields(address = %self.config.address))]
    pub async fn get_secret(&self, path: &str) -> Result<Vec<u8>> {
        self.config.validate()?;

        let parsed = SecretPath::parse(path)?;

        let port = self.config.port_number()?;
        let sock = TransportSocket::connect(&self.config.address, port, self.config.timeout())
            .await?;

        let mut conn = if self.config.tls.enabled {
            Connection::Tls(TlsSession::establish(sock, &self.config).await?)
        } else {
            Connection::Plain(sock)
        };

        let frame = protocol::encode_request(&parsed)?;
        let body = protocol::round_trip(&mut conn, &frame).await?;

        // Dropping the connection closes the socket and frees any TLS
        // session; failure paths above get the same teardown for free.
        drop(conn);

        let secret = protocol::decode_secret(&body)?;

        debug!(size = secret.len(), "secret resolved");
        Ok(secret)
    }
}
