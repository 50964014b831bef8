//! Internationalization module
//!
//! Translation catalogs used to render group labels and status messages.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams};
