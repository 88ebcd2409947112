//! # Transport Layer
//!
//! Connection establishment and exact-size reads/writes over a plaintext or
//! TLS-wrapped socket, with all blocking simulated through non-blocking I/O
//! plus timeout-bounded readiness polling.

pub mod socket;
pub mod tls;

pub use socket::TransportSocket;
pub use tls::TlsSession;

use crate::errors::Result;

/// An established connection to the secret agent for one request.
///
/// Dropping the connection tears everything down: the TLS session (if any)
/// is freed and the socket closed. A connection never outlives one
/// request/response exchange, so there is nothing to return to a pool.
pub enum Connection {
    /// Plaintext TCP.
    Plain(TransportSocket),
    /// TLS over TCP.
    Tls(TlsSession),
}

impl Connection {
    /// Read exactly `buf.len()` bytes from the peer.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            Connection::Plain(sock) => sock.read_exact(buf).await,
            Connection::Tls(session) => session.read_exact(buf).await,
        }
    }

    /// Write exactly `buf.len()` bytes to the peer.
    pub async fn write_exact(&mut self, buf: &[u8]) -> Result<()> {
        match self {
            Connection::Plain(sock) => sock.write_exact(buf).await,
            Connection::Tls(session) => session.write_exact(buf).await,
        }
    }
}
