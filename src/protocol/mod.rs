//! # Wire Protocol
//!
//! Framing codec and response envelope decoding for the agent protocol.

pub mod codec;
pub mod envelope;

pub use codec::{decode_header, encode_request, round_trip, HEADER_SIZE, MAGIC, MAX_RESPONSE_BODY};
pub use envelope::decode_secret;
