//! Process-wide tracing setup.

pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, LogFormat};

/// Initialize process-wide observability (JSON logs unless `AURORA_LOG_FORMAT=pretty`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
