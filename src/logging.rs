//! Log output for the command-line tool.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the binary (or to whatever application embeds the crate).

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a stderr `fmt` subscriber
///
/// `RUST_LOG` takes precedence when set; otherwise this crate logs at `info`
/// (`debug` when `verbose`) and dependencies at `warn`. Calling this more than
/// once, or after another subscriber was installed, is harmless.
pub fn init_logging(verbose: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,misp_ioc_export={level}")));

        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();

        if result.is_err() {
            tracing::debug!("global tracing subscriber already initialized, keeping it");
        }
    });
}
