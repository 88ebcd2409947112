//! # Observability
//!
//! Structured logging setup for the secret agent client. The library itself
//! only emits `tracing` events; installing a subscriber is left to the
//! embedding application, with [`init_logging`] as a convenient default.

pub mod logging;

pub use logging::init_logging;
