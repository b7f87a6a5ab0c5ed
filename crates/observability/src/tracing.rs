//! Tracing/logging initialization.
//!
//! Logs are JSON lines with timestamps. `RUST_LOG` overrides the default
//! filter; otherwise arena crates log at `info` and sqlx is held to `warn`
//! so per-statement logs stay out of the combat trail.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn";

/// Build the filter: `RUST_LOG` if it parses, `default_directives` otherwise.
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). Returns whether
/// this call installed the subscriber.
pub fn init(default_directives: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directives))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_current_span(true)
        .try_init()
        .is_ok()
}
