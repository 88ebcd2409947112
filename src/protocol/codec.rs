//! Wire codec for the agent protocol.
//!
//! Frames are `[4-byte magic][4-byte big-endian body length][JSON body]` in
//! both directions. The protocol is strict request/response: one frame out,
//! one frame in, no pipelining, no partial frames.

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use tracing::warn;

use crate::client::SecretPath;
use crate::errors::{AgentError, Result};
use crate::transport::Connection;

/// Magic constant shared by both peers ("sidekick" in hexspeak).
pub const MAGIC: u32 = 0x51de_c1cc;

/// Size of the magic+length frame header.
pub const HEADER_SIZE: usize = 8;

/// Largest response body accepted from the peer. Declared lengths above
/// this are rejected before any body byte is read, bounding memory use
/// against a misbehaving or malicious peer.
pub const MAX_RESPONSE_BODY: usize = 100 * 1024;

#[derive(Serialize)]
struct SecretRequest<'a> {
    #[serde(rename = "Resource", skip_serializing_if = "Option::is_none")]
    resource: Option<&'a str>,
    #[serde(rename = "SecretKey")]
    secret_key: &'a str,
}

/// Build the framed request for a parsed secret path.
///
/// The `Resource` field is omitted entirely when the path carries no
/// resource qualifier.
pub fn encode_request(path: &SecretPath<'_>) -> Result<Vec<u8>> {
    let request = SecretRequest { resource: path.resource, secret_key: path.key };

    let body = serde_json::to_vec(&request)
        .map_err(|e| AgentError::bad_request(format!("failed to encode request body: {e}")))?;

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + body.len());
    frame.put_u32(MAGIC);
    frame.put_u32(body.len() as u32);
    frame.put_slice(&body);

    debug_assert_eq!(frame.len(), HEADER_SIZE + body.len());

    Ok(frame.to_vec())
}

/// Validate a response header and return the declared body length.
///
/// A magic mismatch means a corrupted or foreign peer, never a retryable
/// condition.
pub fn decode_header(header: [u8; HEADER_SIZE]) -> Result<usize> {
    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);

    if magic != MAGIC {
        warn!(magic = format_args!("{magic:#010x}"), "bad magic in response header");
        return Err(AgentError::protocol(format!("bad magic {magic:#010x} in response header")));
    }

    let body_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;

    if body_len > MAX_RESPONSE_BODY {
        warn!(body_len, max = MAX_RESPONSE_BODY, "declared response body too large");
        return Err(AgentError::protocol(format!(
            "declared body length {body_len} exceeds maximum {MAX_RESPONSE_BODY}"
        )));
    }

    Ok(body_len)
}

/// Send one request frame and read back the response body.
pub async fn round_trip(conn: &mut Connection, frame: &[u8]) -> Result<Vec<u8>> {
    conn.write_exact(frame).await?;

    let mut header = [0u8; HEADER_SIZE];
    conn.read_exact(&mut header).await?;

    let body_len = decode_header(header)?;

    let mut body = vec![0u8; body_len];
    conn.read_exact(&mut body).await?;

    Ok(body)
}
