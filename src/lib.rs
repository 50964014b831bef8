//! EventLens
//!
//! Query engine for browsing nearby events. Given filter criteria it retrieves
//! matching events from a pluggable source, orders them by one of seven sort
//! modes and splits the result into labeled day sections for display.

#![allow(non_snake_case)]

pub mod config;
pub mod engine;
pub mod i18n;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventLensError, Result};

// Re-export main components for easy access
pub use i18n::I18n;
pub use models::{Event, EventGroup, FilterCriteria, SortMode};
pub use services::{QueryCoordinator, QuerySnapshot, QueryState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
