//! Logging setup.
//!
//! QuickDB emits events through `tracing`. Install your own subscriber, or
//! enable the `tracing-subscriber` feature and call [`init`], which is driven
//! by environment variables:
//!
//! - `QUICKDB_DEBUG=true|1|yes` - enable debug logging
//! - `QUICKDB_LOG_LEVEL=trace|debug|info|warn|error` - set a specific level
//! - `QUICKDB_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use quickdb_core::logging;
//!
//! logging::init();
//! ```
//!
//! Levels used inside the crate: connections at `info`, every collection
//! operation at `debug`, and values that silently fell back to a default at
//! `trace`.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "QUICKDB_DEBUG";
const LEVEL_VAR: &str = "QUICKDB_LOG_LEVEL";
const FORMAT_VAR: &str = "QUICKDB_LOG_FORMAT";

/// Check if debug logging is enabled via `QUICKDB_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

/// The log level selected by `QUICKDB_LOG_LEVEL`, falling back to `debug`
/// when `QUICKDB_DEBUG` is set and `warn` otherwise.
pub fn get_log_level() -> &'static str {
    resolve_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// The output format selected by `QUICKDB_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var(FORMAT_VAR).ok().as_deref())
}

/// Initialize logging from the environment.
///
/// Does nothing unless `QUICKDB_DEBUG` or `QUICKDB_LOG_LEVEL` is set.
/// Subsequent calls are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
        return;
    }
    install(get_log_level(), get_log_format());
}

/// Initialize logging at `level`, ignoring `QUICKDB_LOG_LEVEL`.
pub fn init_with_level(level: &str) {
    install(resolve_level(Some(level), false), get_log_format());
}

/// Initialize debug-level logging.
pub fn init_debug() {
    install("debug", get_log_format());
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: &'static str, format: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!("quickdb={},quickdb_core={}", level, level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let installed = match format {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format, "QuickDB logging initialized");
            }
        }
    });
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match requested.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn resolve_format(requested: Option<&str>) -> &'static str {
    match requested.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}
