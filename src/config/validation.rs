//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::engine::MAX_UTC_OFFSET_MINUTES;
use crate::utils::errors::{EventLensError, Result};
use super::{Settings, SourceKind};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_source_config(&settings.source)?;
    validate_query_config(&settings.query)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate event source configuration
fn validate_source_config(config: &super::SourceConfig) -> Result<()> {
    match config.kind {
        SourceKind::Memory | SourceKind::File => {
            if config.file_path.as_deref().map_or(true, |p| p.trim().is_empty()) {
                return Err(EventLensError::Config(
                    format!("Event file path is required for the {} source", config.kind)
                ));
            }
        }
        SourceKind::Http => {
            let base_url = config.base_url.as_deref().unwrap_or_default();
            if base_url.is_empty() {
                return Err(EventLensError::Config(
                    "Base URL is required for the http source".to_string()
                ));
            }
            url::Url::parse(base_url)
                .map_err(|e| EventLensError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        }
    }

    if config.timeout_seconds == 0 {
        return Err(EventLensError::Config(
            "Source timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate query defaults
fn validate_query_config(config: &super::QueryConfig) -> Result<()> {
    if !config.default_radius_km.is_finite() || config.default_radius_km <= 0.0 {
        return Err(EventLensError::Config(
            format!("Default radius must be positive, got {}", config.default_radius_km)
        ));
    }

    if let Some(minutes) = config.utc_offset_minutes {
        if minutes.checked_abs().map_or(true, |m| m > MAX_UTC_OFFSET_MINUTES) {
            return Err(EventLensError::Config(
                format!("UTC offset of {} minutes is out of range", minutes)
            ));
        }
    }

    Ok(())
}

/// Validate internationalization configuration
fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(EventLensError::Config(
            "Default language is required".to_string()
        ));
    }

    if config.supported_languages.is_empty() {
        return Err(EventLensError::Config(
            "At least one supported language is required".to_string()
        ));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(EventLensError::Config(
            "Default language must be in supported languages list".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventLensError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventLensError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_http_source_requires_parsable_url() {
        let mut settings = Settings::default();
        settings.source.kind = SourceKind::Http;
        assert!(validate_settings(&settings).is_err());

        settings.source.base_url = Some("not a url".to_string());
        assert!(validate_settings(&settings).is_err());

        settings.source.base_url = Some("http://localhost:8080".to_string());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_file_source_requires_path() {
        let mut settings = Settings::default();
        settings.source.file_path = Some("  ".to_string());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_memory_source_requires_seed_file() {
        let mut settings = Settings::default();
        settings.source.kind = SourceKind::Memory;
        settings.source.file_path = None;
        assert!(validate_settings(&settings).is_err());

        settings.source.file_path = Some("events.json".to_string());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_query_bounds() {
        let mut settings = Settings::default();
        settings.query.default_radius_km = -1.0;
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.query.utc_offset_minutes = Some(19 * 60);
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(matches!(validate_settings(&settings), Err(EventLensError::Config(_))));
    }
}
