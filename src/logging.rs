//! Log output for the command line binary.

use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber filtered by `RUST_LOG`, defaulting to `info`
/// for this crate and `warn` for everything else.
pub fn init(verbose: bool) -> crate::Result<()> {
    let fallback = if verbose {
        "warn,shuroku=debug"
    } else {
        "warn,shuroku=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|e| crate::Error::Other(format!("build log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| crate::Error::Other(format!("initialize tracing subscriber: {e}")))
}
