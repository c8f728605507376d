//! Structured logging using **tracing**.
//!
//! Library code emits `tracing` events directly (`debug!` for per-edge
//! decisions, `warn!` for diagnostics, `info!` for run summaries). Binaries
//! call [`init_structured_logging`] once to route them to stderr as JSON.

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Call once at startup. Output is JSON on stderr so stdout stays clean for
/// reports.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=deadexport_core=debug`).
///   Defaults to `warn` when unset.
pub fn init_structured_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}

/// Logs an event with an explicit name; `ERROR` and `WARN` pick the level.
pub fn log_event(event: &str, detail: &str) {
    match event.to_uppercase().as_str() {
        "ERROR" => error!(event = %event, detail = %detail),
        "WARN" | "WARNING" => warn!(event = %event, detail = %detail),
        _ => info!(event = %event, detail = %detail),
    }
}
