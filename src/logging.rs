// Logging setup: `RUST_LOG` wins, otherwise the configured level.
// Output goes to stderr so stdout stays clean for `browse --json`.

use tracing_subscriber::{fmt, EnvFilter};

pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber; a second call is a no-op
pub fn init(default_level: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
