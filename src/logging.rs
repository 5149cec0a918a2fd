//! Logging init: structured output to stderr, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,repo_size=debug";
const QUIET_FILTER: &str = "warn";

/// Initialize logging to stderr. `verbose` selects the debug filter when
/// `RUST_LOG` is unset. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { DEFAULT_FILTER } else { QUIET_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
