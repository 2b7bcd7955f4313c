//! Log setup
//!
//! Logs go to stderr so the TAP stream on stdout stays machine readable.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `--debug`
pub fn init(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(debug))),
        )
        .try_init();
}
