//! Observability.
//!
//! Logging goes to stderr: stdout belongs to the hook pass-through channel
//! and must never carry diagnostics. Metrics counters are emitted through
//! the `metrics` facade; no exporter is wired in a hook process, so they
//! no-op unless a recorder is installed by an embedding binary.

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber.
///
/// The filter defaults to `info` (`debug` with `verbose`) and honors
/// `RUST_LOG`. Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
