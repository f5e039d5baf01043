//! Tracing setup for the CLI

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a stderr subscriber.
///
/// `RUST_LOG` selects the level, defaulting to `warn`; `verbose` forces `debug`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .compact();

    // Already installed when called twice in one process
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
    tracing::debug!("Logging initialised");
}
