//! Translation loader and i18n management
//!
//! This module provides translation loading, language fallback and message
//! formatting. The English catalog is compiled in so labels always resolve;
//! further languages are read from the configured translations directory.

use std::collections::HashMap;
use std::path::Path;
use serde_json::{Value, Map};
use tokio::fs;
use tracing::{info, warn, error, debug};
use crate::utils::errors::{EventLensError, Result};
use crate::config::I18nConfig;

const BUILTIN_LANGUAGE: &str = "en";
const BUILTIN_CATALOG: &str = include_str!("../../translations/en.json");

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    /// Default language code
    default_language: String,
    /// Supported language codes
    supported_languages: Vec<String>,
    /// Directory holding `<lang>.json` catalogs
    translations_dir: Option<String>,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Create an I18n instance with no catalogs loaded
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            translations_dir: config.translations_dir.clone(),
        }
    }

    /// Create an I18n instance with the compiled-in English catalog
    pub fn with_builtin_catalog(config: &I18nConfig) -> Self {
        let mut i18n = Self::new(config);
        match serde_json::from_str::<Value>(BUILTIN_CATALOG) {
            Ok(Value::Object(map)) => {
                i18n.translations.insert(BUILTIN_LANGUAGE.to_string(), map);
            }
            _ => error!("Built-in translation catalog is not a JSON object"),
        }
        i18n
    }

    /// Load all translation files from the translations directory
    pub async fn load_translations(&mut self) -> Result<()> {
        let Some(dir) = self.translations_dir.clone() else {
            debug!("No translations directory configured, using built-in catalog only");
            return self.ensure_default_loaded();
        };
        let translations_dir = Path::new(&dir);

        if !translations_dir.exists() {
            warn!(dir = %dir, "Translations directory not found");
            return self.ensure_default_loaded();
        }

        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = translations_dir.join(format!("{}.json", lang_code));

            if file_path.exists() {
                match self.load_language_file(&file_path, lang_code).await {
                    Ok(_) => info!("Loaded translations for language: {}", lang_code),
                    Err(e) => {
                        error!("Failed to load translations for {}: {}", lang_code, e);
                        if lang_code == &self.default_language && !self.translations.contains_key(lang_code) {
                            return Err(EventLensError::Config(
                                format!("Failed to load default language translations: {}", e)
                            ));
                        }
                    }
                }
            } else {
                warn!("Translation file not found: {}", file_path.display());
            }
        }

        self.ensure_default_loaded()
    }

    fn ensure_default_loaded(&self) -> Result<()> {
        if self.translations.contains_key(&self.default_language) {
            Ok(())
        } else {
            Err(EventLensError::Config(format!(
                "No translations available for default language: {}",
                self.default_language
            )))
        }
    }

    /// Load a single language file
    async fn load_language_file(&mut self, file_path: &Path, lang_code: &str) -> Result<()> {
        let content = fs::read_to_string(file_path).await?;
        let translations: Value = serde_json::from_str(&content)?;

        if let Value::Object(map) = translations {
            debug!("Loaded {} top-level translation keys for {}", map.len(), lang_code);
            self.translations.insert(lang_code.to_string(), map);
        } else {
            return Err(EventLensError::Config(
                format!("Invalid translation file format for {}", lang_code)
            ));
        }

        Ok(())
    }

    /// Get a translated message
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let found = self
            .get_translation_value(key, &effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language))
            .or_else(|| self.get_translation_value(key, BUILTIN_LANGUAGE));

        match found {
            Some(translation) => {
                let text = self.extract_text_from_value(translation);
                self.format_message(&text, params)
            }
            None => {
                warn!("Translation key '{}' not found in any language", key);
                key.to_string()
            }
        }
    }

    /// Get a translated message with pluralization support
    pub fn tp(&self, key: &str, lang: &str, count: i64, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);
        let plural_key = self.get_plural_key(key, count, &effective_lang);

        let mut final_params = params.cloned().unwrap_or_default();
        final_params.insert("count".to_string(), count.to_string());

        self.t(&plural_key, &effective_lang, Some(&final_params))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|supported| supported == lang)
    }

    /// Get the effective language (fallback to default if not supported)
    fn get_effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Get translation value from nested JSON structure
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<&Value> {
        let translations = self.translations.get(lang)?;

        // Support nested keys like "groups.captions.date_ascending"
        let mut parts = key.split('.');
        let mut current = translations.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }

        Some(current)
    }

    /// Extract text from JSON value (handle both strings and objects with pluralization)
    fn extract_text_from_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                // For pluralization objects, default to "other" or first available key
                if let Some(other) = obj.get("other") {
                    self.extract_text_from_value(other)
                } else if let Some((_, first_value)) = obj.iter().next() {
                    self.extract_text_from_value(first_value)
                } else {
                    String::new()
                }
            }
            _ => value.to_string(),
        }
    }

    /// Format message with parameters
    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        if let Some(params) = params {
            let mut result = template.to_string();
            for (key, value) in params {
                let placeholder = format!("{{{}}}", key);
                result = result.replace(&placeholder, value);
            }
            result
        } else {
            template.to_string()
        }
    }

    /// Get the appropriate plural key based on count and language rules
    fn get_plural_key(&self, base_key: &str, count: i64, lang: &str) -> String {
        let plural_form = self.get_plural_form(count, lang);
        format!("{}.{}", base_key, plural_form)
    }

    /// Determine plural form based on language-specific rules
    fn get_plural_form(&self, count: i64, lang: &str) -> &'static str {
        match lang {
            "ru" => {
                // Russian: one, few, many
                let abs_count = count.abs();
                let last_digit = abs_count % 10;
                let last_two_digits = abs_count % 100;

                if last_digit == 1 && last_two_digits != 11 {
                    "one"
                } else if (2..=4).contains(&last_digit) && !(12..=14).contains(&last_two_digits) {
                    "few"
                } else {
                    "many"
                }
            }
            _ => {
                if count == 1 { "one" } else { "other" }
            }
        }
    }

    /// Get supported languages
    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    /// Get default language
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Normalize a locale such as "en-US" to a supported language code
    pub fn detect_language(&self, locale: Option<&str>) -> String {
        if let Some(locale) = locale {
            let lang_code = locale.split(['-', '_']).next().unwrap_or(locale);

            if self.is_language_supported(lang_code) {
                return lang_code.to_string();
            }
        }

        self.default_language.clone()
    }
}
