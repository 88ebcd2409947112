//! Shared test support: an in-process mock secret agent (plaintext and TLS)
//! and an ephemeral test PKI.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, SanType};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

pub const MAGIC: u32 = 0x51de_c1cc;
pub const HEADER_SIZE: usize = 8;

/// Wrap a body in the magic+length frame.
pub fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&MAGIC.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// A framed `{"SecretValue": base64(value)}` response.
pub fn secret_response(value: &[u8]) -> Vec<u8> {
    let body = serde_json::to_vec(&serde_json::json!({ "SecretValue": STANDARD.encode(value) }))
        .unwrap();
    frame(&body)
}

/// A framed `{"Error": message}` response.
pub fn error_response(message: &str) -> Vec<u8> {
    let body = serde_json::to_vec(&serde_json::json!({ "Error": message })).unwrap();
    frame(&body)
}

async fn read_request<S>(stream: &mut S) -> serde_json::Value
where
    S: AsyncReadExt + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).await.unwrap();

    let magic = u32::from_be_bytes(header[0..4].try_into().unwrap());
    assert_eq!(magic, MAGIC, "client sent bad magic");

    let body_len = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;
    let mut body = vec![0u8; body_len];
    stream.read_exact(&mut body).await.unwrap();

    serde_json::from_slice(&body).unwrap()
}

/// Spawn a plaintext mock agent serving exactly one request.
///
/// Returns the listening port and a handle resolving to the request JSON
/// the client sent.
pub async fn spawn_agent<F>(respond: F) -> (u16, JoinHandle<serde_json::Value>)
where
    F: FnOnce(&serde_json::Value) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = respond(&request);
        stream.write_all(&response).await.unwrap();
        stream.flush().await.unwrap();
        request
    });

    (port, handle)
}

/// Spawn a mock agent that accepts one connection and closes it without
/// ever responding to the request.
pub async fn spawn_agent_closing_early() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        drop(stream);
    });

    port
}

/// CA plus a localhost server certificate signed by it.
pub struct TestPki {
    pub ca_pem: String,
    cert_chain: Vec<CertificateDer<'static>>,
    server_key: PrivateKeyDer<'static>,
}

impl TestPki {
    pub fn new() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.distinguished_name.push(DnType::CommonName, "secret agent test CA");
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();

        let server_key = KeyPair::generate().unwrap();
        let mut server_params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        server_params.distinguished_name.push(DnType::CommonName, "secret agent test server");
        server_params
            .subject_alt_names
            .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        let server_cert = server_params.signed_by(&server_key, &ca_cert, &ca_key).unwrap();

        Self {
            ca_pem: ca_cert.pem(),
            cert_chain: vec![server_cert.der().clone(), ca_cert.der().clone()],
            server_key: PrivatePkcs8KeyDer::from(server_key.serialize_der()).into(),
        }
    }

    fn acceptor(&self) -> TlsAcceptor {
        // ServerConfig::builder() needs the process provider in place.
        secret_agent_client::transport::tls::ensure_tls_provider();

        let config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(self.cert_chain.clone(), self.server_key.clone_key())
            .unwrap();
        TlsAcceptor::from(Arc::new(config))
    }
}

/// Spawn a TLS mock agent serving exactly one request with the given PKI.
///
/// Handshake failures on the server side are swallowed so tests asserting
/// client-side rejection do not panic the server task.
pub async fn spawn_tls_agent<F>(pki: &TestPki, respond: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(&serde_json::Value) -> Vec<u8> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let acceptor = pki.acceptor();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut stream = match acceptor.accept(stream).await {
            Ok(stream) => stream,
            Err(_) => return,
        };

        let request = read_request(&mut stream).await;
        let response = respond(&request);
        stream.write_all(&response).await.unwrap();
        stream.flush().await.unwrap();
    });

    (port, handle)
}
