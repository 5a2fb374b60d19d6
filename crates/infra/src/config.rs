//! Configuration loading from the process environment.
//!
//! Lookups go through a closure so that callers (and tests) can supply values
//! without mutating the real environment.

use std::str::FromStr;

use tracing::warn;

/// Parse `key` through `lookup`, falling back to `default` when the variable is
/// missing or unparsable.
pub fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, default = ?default, "invalid config value; using default");
                default
            }
        },
    }
}

/// Lookup backed by `std::env`.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
