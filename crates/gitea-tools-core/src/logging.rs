//! Subscriber setup for the binary. `RUST_LOG` takes precedence over the
//! built-in filters.

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const DEFAULT_LOG_FILTER: &str =
    "gitea_tools=warn,gitea_tools_core=warn,gitea_tools_gitea=warn";
pub const VERBOSE_LOG_FILTER: &str =
    "gitea_tools=debug,gitea_tools_core=debug,gitea_tools_gitea=debug";

pub fn init(verbose: bool) {
    init_with_default(if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    });
}

/// Installs the global subscriber, writing to stderr so that stdout carries
/// nothing but the tool result. A second call leaves the first subscriber in
/// place.
pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    if tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed");
    }
}
