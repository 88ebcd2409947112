//! TLS session layered over [`TransportSocket`].
//!
//! rustls is driven by hand so the would-block signaling stays explicit:
//! each operation (handshake, read, write) attempts a rustls primitive
//! against the non-blocking socket, and on `WouldBlock` polls for readiness
//! in the indicated direction before retrying the *same* primitive. TLS
//! protocol or certificate verification failures are fatal and never
//! retried.

use std::io::{self, Read, Write};
use std::sync::{Arc, Once};

use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::errors::{AgentError, Result};
use crate::transport::TransportSocket;

static TLS_PROVIDER_INIT: Once = Once::new();

/// Install the process-wide rustls crypto provider.
///
/// Performed at most once and idempotent afterwards; safe under concurrent
/// first use from multiple threads.
pub fn ensure_tls_provider() {
    TLS_PROVIDER_INIT.call_once(|| {
        // The host application may have installed its own provider already;
        // an Err here just means a provider is in place.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Single-attempt I/O view of the tokio socket for rustls record pumping.
/// `WouldBlock` surfaces to the session loop, which polls and retries.
struct NonblockingIo<'a>(&'a TcpStream);

impl Read for NonblockingIo<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.try_read(buf)
    }
}

impl Write for NonblockingIo<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.try_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Parse the PEM CA bundle into a trust store.
///
/// A bundle that yields zero usable certificates is a configuration error.
fn build_root_store(ca_bundle: &str) -> Result<RootCertStore> {
    let mut cursor = ca_bundle.as_bytes();

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cursor)
        .collect::<io::Result<_>>()
        .map_err(|e| AgentError::bad_config(format!("invalid PEM in CA bundle: {e}")))?;

    let mut store = RootCertStore::empty();
    let (added, ignored) = store.add_parsable_certificates(certs);

    if ignored > 0 {
        warn!(ignored, "skipped unparsable certificates in CA bundle");
    }

    if added == 0 {
        return Err(AgentError::bad_config(
            "CA bundle does not contain any usable certificates",
        ));
    }

    debug!(added, "loaded CA certificates into trust store");
    Ok(store)
}

/// A TLS session wrapping a connected transport socket.
///
/// Dropping the session frees the rustls connection and closes the socket.
pub struct TlsSession {
    sock: TransportSocket,
    conn: ClientConnection,
}

impl TlsSession {
    /// Wrap a connected socket in TLS and complete the handshake.
    ///
    /// The server certificate is verified against the configured CA bundle
    /// only; there is no fallback to system roots. SNI is taken from the
    /// configured address.
    pub async fn establish(sock: TransportSocket, config: &AgentConfig) -> Result<Self> {
        ensure_tls_provider();

        let ca_bundle = config
            .tls
            .ca_bundle
            .as_deref()
            .ok_or_else(|| AgentError::bad_config("TLS is enabled but no CA bundle was provided"))?;

        let roots = build_root_store(ca_bundle)?;

        let tls_config =
            ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();

        let server_name = ServerName::try_from(config.address.clone()).map_err(|_| {
            AgentError::bad_config(format!(
                "address {:?} is not a valid TLS server name",
                config.address
            ))
        })?;

        let conn = ClientConnection::new(Arc::new(tls_config), server_name)
            .map_err(|e| AgentError::bad_config(format!("failed to create TLS session: {e}")))?;

        let mut session = Self { sock, conn };
        session.handshake().await?;
        Ok(session)
    }

    /// Drive the handshake to completion.
    ///
    /// rustls reports which direction it is blocked on; the loop polls for
    /// that direction and resumes the handshake. A verification or protocol
    /// failure aborts immediately as [`AgentError::ConnectFailed`].
    async fn handshake(&mut self) -> Result<()> {
        while self.conn.is_handshaking() {
            if self.conn.wants_write() {
                self.pump_writes().await?;
            } else if self.conn.wants_read() {
                self.pump_reads(true).await?;
            } else {
                // rustls always wants one direction mid-handshake.
                return Err(AgentError::connect_failed("tls handshake stalled"));
            }
        }

        // Flush any records queued while the handshake finished.
        self.pump_writes().await?;

        debug!("tls handshake complete");
        Ok(())
    }

    /// Read exactly `buf.len()` plaintext bytes.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.conn.reader().read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(AgentError::peer_closed(format!(
                        "tls stream ended after {filled} of {} bytes",
                        buf.len()
                    )))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // No buffered plaintext; pull more records off the
                    // socket, then retry the same read.
                    self.pump_reads(false).await?;
                }
                Err(e) => return Err(AgentError::io("tls read failed", e)),
            }
        }

        Ok(())
    }

    /// Write exactly `buf.len()` plaintext bytes and flush the resulting
    /// records to the socket.
    pub async fn write_exact(&mut self, buf: &[u8]) -> Result<()> {
        self.conn
            .writer()
            .write_all(buf)
            .map_err(|e| AgentError::io("tls write buffering failed", e))?;

        self.pump_writes().await
    }

    /// Send every pending TLS record, polling for writability as needed.
    async fn pump_writes(&mut self) -> Result<()> {
        while self.conn.wants_write() {
            self.sock.wait_ready(false).await?;

            match self.conn.write_tls(&mut NonblockingIo(self.sock.stream())) {
                Ok(_) => {}
                // Readiness was stale; poll again and retry the same write.
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(AgentError::io("tls record write failed", e)),
            }
        }

        Ok(())
    }

    /// Pull at least one TLS record off the socket and process it.
    ///
    /// `handshaking` selects the error kind for a fatal TLS failure:
    /// handshake failures (including certificate verification) surface as
    /// `ConnectFailed`, post-handshake record corruption as `Protocol`.
    async fn pump_reads(&mut self, handshaking: bool) -> Result<()> {
        self.sock.wait_ready(true).await?;

        loop {
            match self.conn.read_tls(&mut NonblockingIo(self.sock.stream())) {
                Ok(0) => {
                    return Err(AgentError::peer_closed("peer closed during tls exchange"));
                }
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.sock.wait_ready(true).await?;
                }
                Err(e) => return Err(AgentError::io("tls record read failed", e)),
            }
        }

        if let Err(e) = self.conn.process_new_packets() {
            // Best-effort attempt to send the alert rustls queued; the
            // session is unusable either way.
            let _ = self.conn.write_tls(&mut NonblockingIo(self.sock.stream()));

            warn!(error = %e, handshaking, "fatal tls failure");

            return Err(if handshaking {
                AgentError::connect_failed(format!("tls handshake failed: {e}"))
            } else {
                AgentError::protocol(format!("tls protocol error: {e}"))
            });
        }

        Ok(())
    }
}
