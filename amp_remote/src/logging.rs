use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber on stderr, filtered by `RUST_LOG`.
/// Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
