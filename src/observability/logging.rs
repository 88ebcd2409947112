//! # Structured Logging
//!
//! Default `tracing-subscriber` setup. Log sites throughout the client use
//! structured fields (`address`, `magic`, `body_len`, ...) rather than
//! formatted strings, and never include secret material.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a formatting subscriber honoring `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// Tests call this freely without caring who won.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
