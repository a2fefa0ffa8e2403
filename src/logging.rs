//! Tracing setup
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! takes precedence over the default level.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset
pub fn default_level(verbose: bool) -> Level {
    if verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .from_env_lossy()
}

/// Install the global subscriber; a second call is a no-op
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
