//! Translation quality validation module.
//!
//! This module provides validation for translated UI strings to ensure that
//! important elements are preserved during translation (e.g., {placeholder}
//! interpolation tokens and URLs).
//!
//! Validation is advisory: mismatches produce warnings that are logged, never
//! errors that block caching or resolution.

use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Critical errors that indicate translation issues
    pub errors: Vec<String>,

    /// Non-critical warnings about potential issues
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translation quality.
pub struct TranslationValidator;

// Regex patterns for extraction (cached for performance)
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate that a translation preserves important elements from the original.
    ///
    /// This function checks that:
    /// - {placeholder} interpolation tokens are preserved
    /// - URLs are preserved
    ///
    /// Word order legitimately changes across languages, so both checks
    /// compare sorted sets rather than positions.
    ///
    /// # Arguments
    /// * `original` - The original source text (before translation)
    /// * `translated` - The translated text
    ///
    /// # Returns
    /// A `ValidationReport` containing any warnings found.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        // Check {placeholder} tokens
        let mut orig_placeholders = Self::extract_placeholders(original);
        let mut trans_placeholders = Self::extract_placeholders(translated);
        orig_placeholders.sort();
        trans_placeholders.sort();
        if orig_placeholders != trans_placeholders {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig_placeholders, trans_placeholders
            ));
        }

        // Check URLs
        let mut orig_urls = Self::extract_urls(original);
        let mut trans_urls = Self::extract_urls(translated);
        orig_urls.sort();
        trans_urls.sort();
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        report
    }

    /// Extract all {placeholder} tokens from text
    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{([a-zA-Z0-9_]+)\}").unwrap());

        regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(0).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Extract all URLs from text
    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
