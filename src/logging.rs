//! Tracing subscriber initialisation.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber for console diagnostics.
///
/// `RUST_LOG` takes precedence when set; otherwise the verbose flag selects
/// between `converge=debug` and `converge=info`. Safe to call more than once
/// (later calls are no-ops).
pub fn init(verbose: bool) {
    let default = if verbose {
        "converge=debug"
    } else {
        "converge=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
