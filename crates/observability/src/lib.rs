//! Process-wide tracing setup shared by the binaries.

/// Initialize tracing with the format named by `ORDERDESK_LOG_FORMAT`.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    self::tracing::init(self::tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, formats).
pub mod tracing;
