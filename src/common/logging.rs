//! Logging and tracing configuration
//!
//! The scenario report goes to stdout, so tracing output is written to
//! stderr. Levels are controlled by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the suite CLI
///
/// Default level is INFO for this crate (DEBUG with `verbose`), WARN for
/// dependencies. Request/response exchanges are logged at DEBUG.
pub fn init_cli(verbose: bool) {
    let default_filter = if verbose {
        "posts_e2e=debug,warn"
    } else {
        "posts_e2e=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing for the mock API server
///
/// Every handled request is logged at INFO by default.
pub fn init_mock_server() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("posts_e2e=info,mock_api=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();
}
