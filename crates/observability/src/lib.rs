//! Tracing and logging setup shared by the arena binaries and tests.

/// Initialize process-wide structured logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_DIRECTIVES);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
