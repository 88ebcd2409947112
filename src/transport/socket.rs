//! Non-blocking TCP transport with timeout-bounded readiness polling.
//!
//! Every blocking step is simulated over the non-blocking socket: poll for
//! readiness with the configured per-step timeout, perform a single
//! non-blocking read/write attempt, and repeat. Each `read_exact` or
//! `write_exact` call gets the full timeout budget; it is not decremented
//! across the lifetime of one request.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::Interest;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::{AgentError, Result};

/// A connected, non-blocking socket to the secret agent.
///
/// Dropping the socket closes the underlying descriptor.
#[derive(Debug)]
pub struct TransportSocket {
    stream: TcpStream,
    timeout: Duration,
}

impl TransportSocket {
    /// Connect to `address:port`, trying resolved endpoints in order and
    /// keeping the first that accepts within the timeout.
    ///
    /// Resolution failure (or an address that resolves to nothing) is a
    /// [`AgentError::BadConfig`]; exhausting all endpoints is
    /// [`AgentError::ConnectFailed`].
    pub async fn connect(address: &str, port: u16, per_step: Duration) -> Result<Self> {
        let endpoints: Vec<SocketAddr> = lookup_host((address, port))
            .await
            .map_err(|e| {
                AgentError::bad_config(format!("failed to resolve address {address:?}: {e}"))
            })?
            .collect();

        if endpoints.is_empty() {
            return Err(AgentError::bad_config(format!(
                "address {address:?} did not resolve to any endpoint"
            )));
        }

        let mut last_error = String::new();

        for addr in endpoints {
            match timeout(per_step, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    debug!(%addr, "connected to secret agent");
                    return Ok(Self { stream, timeout: per_step });
                }
                Ok(Err(e)) => {
                    warn!(%addr, error = %e, "connect attempt failed");
                    last_error = e.to_string();
                }
                Err(_) => {
                    warn!(%addr, "connect attempt timed out");
                    last_error = "connect timed out".to_string();
                }
            }
        }

        Err(AgentError::connect_failed(format!(
            "no endpoint for {address}:{port} accepted a connection: {last_error}"
        )))
    }

    /// Poll the socket for readiness in the requested direction, bounded by
    /// the per-step timeout.
    pub async fn wait_ready(&self, want_read: bool) -> Result<()> {
        let (interest, operation) = if want_read {
            (Interest::READABLE, "socket poll for read")
        } else {
            (Interest::WRITABLE, "socket poll for write")
        };

        match timeout(self.timeout, self.stream.ready(interest)).await {
            Ok(Ok(_ready)) => Ok(()),
            Ok(Err(e)) => Err(AgentError::io("socket readiness poll failed", e)),
            Err(_) => {
                warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "poll timed out");
                Err(AgentError::timeout(operation))
            }
        }
    }

    /// Read exactly `buf.len()` bytes, polling before each attempt.
    ///
    /// A zero-byte read means the peer closed the connection mid-frame and
    /// is reported as an I/O error, distinct from a timeout.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < buf.len() {
            self.wait_ready(true).await?;

            match self.stream.try_read(&mut buf[filled..]) {
                Ok(0) => {
                    warn!(filled, expected = buf.len(), "peer closed connection mid-read");
                    return Err(AgentError::peer_closed(format!(
                        "peer closed after {filled} of {} bytes",
                        buf.len()
                    )));
                }
                Ok(n) => filled += n,
                // Readiness was stale; poll again and retry the same read.
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(AgentError::io("socket read failed", e)),
            }
        }

        Ok(())
    }

    /// Write exactly `buf.len()` bytes, polling before each attempt.
    pub async fn write_exact(&mut self, buf: &[u8]) -> Result<()> {
        let mut written = 0;

        while written < buf.len() {
            self.wait_ready(false).await?;

            match self.stream.try_write(&buf[written..]) {
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(AgentError::io("socket write failed", e)),
            }
        }

        Ok(())
    }

    /// Borrow the underlying stream for single non-blocking attempts.
    pub(crate) fn stream(&self) -> &TcpStream {
        &self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unresolvable_address_is_bad_config() {
        let err = TransportSocket::connect(
            "definitely-not-a-real-host.invalid",
            3005,
            Duration::from_millis(500),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AgentError::BadConfig { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_failed() {
        // Bind then drop a listener so the port is very likely closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TransportSocket::connect("127.0.0.1", port, Duration::from_millis(500))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ConnectFailed { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_read_exact_reports_peer_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut sock =
            TransportSocket::connect("127.0.0.1", port, Duration::from_millis(500)).await.unwrap();
        server.await.unwrap();

        let mut buf = [0u8; 8];
        let err = sock.read_exact(&mut buf).await.unwrap_err();
        assert!(matches!(err, AgentError::Io { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_read_exact_times_out_on_silent_peer() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut sock =
            TransportSocket::connect("127.0.0.1", port, Duration::from_millis(100)).await.unwrap();
        let (_held, _) = listener.accept().await.unwrap();

        let mut buf = [0u8; 8];
        let err = sock.read_exact(&mut buf).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout { .. }), "got {err:?}");
    }
}
