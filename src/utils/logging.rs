//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the query lifecycle.

use std::path::Path;

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{EventLensError, Result};

/// Initialize logging based on configuration.
///
/// When a log file is configured the returned guard must be kept alive for
/// buffered lines to be flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let (file_layer, guard) = match config.file_path.as_deref() {
        Some(file_path) => {
            let path = Path::new(file_path);
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| EventLensError::Config(format!("Invalid log file path: {}", file_path)))?;

            let file_appender = tracing_appender::rolling::daily(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| EventLensError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a retrieval request leaving the coordinator
pub fn log_query_dispatched(sequence: u64, refresh: bool, has_location: bool, search: Option<&str>) {
    info!(
        sequence = sequence,
        refresh = refresh,
        has_location = has_location,
        search = search,
        "Event query dispatched"
    );
}

/// Log a query whose results were published
pub fn log_query_completed(sequence: u64, event_count: usize, group_count: usize, duration_ms: u64) {
    info!(
        sequence = sequence,
        event_count = event_count,
        group_count = group_count,
        duration_ms = duration_ms,
        "Event query completed"
    );
}

/// Log a response that arrived after a newer request was issued
pub fn log_stale_response(sequence: u64, latest: u64) {
    debug!(
        sequence = sequence,
        latest = latest,
        "Discarding response for superseded query"
    );
}

/// Log a failed retrieval
pub fn log_retrieval_failure(sequence: u64, error: &str) {
    warn!(
        sequence = sequence,
        error = error,
        "Event retrieval failed"
    );
}

/// Log an event dropped at the retrieval boundary
pub fn log_invalid_event(event_id: &str, reason: &str) {
    warn!(
        event_id = event_id,
        reason = reason,
        "Dropping invalid event"
    );
}

/// Log a failed location lookup
pub fn log_location_unavailable(reason: &str) {
    warn!(reason = reason, "Current location unavailable");
}
