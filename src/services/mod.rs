//! Services module
//!
//! This module contains the asynchronous side of the crate: event sources,
//! the location collaborator and the query coordinator.

pub mod coordinator;
pub mod location;
pub mod retrieval;

// Re-export commonly used services
pub use coordinator::{Clock, QueryCoordinator, QueryIssue, QueryOutcome, QuerySnapshot, QueryState};
pub use location::{FixedLocationProvider, LocationProvider};
pub use retrieval::{EventSource, FileEventSource, HttpEventSource, InMemoryEventSource};

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::settings::{Settings, SourceKind};
use crate::utils::errors::{EventLensError, Result};

/// Build the event source selected in `settings`
pub async fn build_event_source(settings: &Settings) -> Result<Arc<dyn EventSource>> {
    let source = &settings.source;
    let file_path = || {
        source.file_path.clone().ok_or_else(|| {
            EventLensError::Config(format!("source.file_path is required for the {} source", source.kind))
        })
    };

    let built: Arc<dyn EventSource> = match source.kind {
        SourceKind::Memory => {
            let path = file_path()?;
            info!(path = %path, "Using in-memory event source");
            Arc::new(InMemoryEventSource::load(path).await?)
        }
        SourceKind::File => {
            let path = file_path()?;
            info!(path = %path, "Using file event source");
            Arc::new(FileEventSource::new(path))
        }
        SourceKind::Http => {
            let base_url = source.base_url.as_deref().ok_or_else(|| {
                EventLensError::Config("source.base_url is required for the http source".to_string())
            })?;
            info!(base_url = %base_url, timeout_seconds = source.timeout_seconds, "Using HTTP event source");
            Arc::new(HttpEventSource::new(base_url, Duration::from_secs(source.timeout_seconds))?)
        }
    };

    Ok(built)
}
