//! Process-wide tracing setup shared by binaries and tests.

/// Initialize structured logging.
///
/// Safe to call multiple times; only the first call installs a subscriber.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filters, output format).
pub mod tracing;
