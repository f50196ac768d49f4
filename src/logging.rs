//! Structured logging setup.
//!
//! Logs go to stderr so `faq search --json` keeps stdout machine-readable.
//! Verbosity follows `RUST_LOG` (e.g. `RUST_LOG=faq_harness=debug`) and
//! defaults to `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .ok();
}
