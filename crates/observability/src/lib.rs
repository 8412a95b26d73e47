//! Process-wide tracing setup shared by every gymjobs binary.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize with an explicit output format.
pub fn init_with(format: LogFormat) {
    tracing::init_with(format);
}
