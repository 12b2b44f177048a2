//! Tracing subscriber setup.
//!
//! Sessions log through `tracing` inside a `bridge_session` span carrying
//! `session_id` and `token_address`. Applications embedding the crate
//! usually install their own subscriber; [`init_tracing`] is for binaries
//! and tests that have none.

use tracing_subscriber::EnvFilter;

/// Installs a global subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`. With `json` set, each line is
/// a JSON object including the current span fields. Calling this again, or
/// after another subscriber was installed, is a no-op.
pub fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };
}
