//! Tracing/logging initialization.
//!
//! JSON lines by default; set `STOCKPOOL_LOG_FORMAT=pretty` for human-readable
//! output while developing. Filtering follows `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "STOCKPOOL_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Unknown values fall back to JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

pub fn init() {
    let format = LogFormat::parse(std::env::var(LOG_FORMAT_VAR).ok().as_deref());
    init_with(format);
}

/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => builder.pretty().with_target(true).try_init(),
    };
}
