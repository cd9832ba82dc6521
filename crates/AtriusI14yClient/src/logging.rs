//! Tracing setup shared by both command-line tools.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level` applies to the client and
/// transform crates. Calling this twice is harmless: the second call is ignored.
pub fn init_tracing(level: &str) {
    let filter = format!(
        "atrius_i14y_client={},atrius_i14y_transform={}",
        level, level
    );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_target(false)
        .try_init();
}
