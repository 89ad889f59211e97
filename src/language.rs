//! Language type and registry: single source of truth for supported locales.
//!
//! The registry is a static catalog of every locale the application knows
//! about, including ones staged behind a disabled flag ahead of rollout. The
//! `Language` type can only be constructed for registered, enabled locales,
//! so every `Language` value flowing through the store is already validated.
//!
//! One registered locale is the *identity language* (`en`): its text is
//! definitionally the source text, so it is never looked up, translated, or
//! cached.

use std::fmt;
use std::sync::OnceLock;

use anyhow::{bail, Result};

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "hi")
    pub code: &'static str,

    /// English name of the language (e.g., "Hindi")
    pub name: &'static str,

    /// Native name of the language (e.g., "हिन्दी")
    pub native_name: &'static str,

    /// Whether this is the identity (source) language (exactly one is true)
    pub is_identity: bool,

    /// Whether this language is enabled for use
    pub enabled: bool,
}

/// Global language registry.
///
/// Initialized once on first access and immutable thereafter. This is static
/// catalog data, not mutable application state; the mutable store itself is
/// never a singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Look up a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All enabled languages, identity language included.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// All registered languages, including disabled ones.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// The identity language configuration.
    ///
    /// # Panics
    /// Panics if the registry defines zero or multiple identity languages,
    /// which indicates a broken catalog.
    pub fn identity(&self) -> &LanguageConfig {
        let identity_langs: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_identity)
            .collect();

        match identity_langs.len() {
            0 => panic!("No identity language found in registry"),
            1 => identity_langs[0],
            _ => panic!("Multiple identity languages found in registry"),
        }
    }

    /// Check whether a language code is registered and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

/// Default language catalog.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_identity: true,
            enabled: true,
        },
        LanguageConfig {
            code: "hi",
            name: "Hindi",
            native_name: "हिन्दी",
            is_identity: false,
            enabled: true,
        },
        LanguageConfig {
            code: "mr",
            name: "Marathi",
            native_name: "मराठी",
            is_identity: false,
            enabled: true,
        },
        // Staged for a later release; strings are still under review.
        LanguageConfig {
            code: "ta",
            name: "Tamil",
            native_name: "தமிழ்",
            is_identity: false,
            enabled: false,
        },
    ]
}

/// A validated language.
///
/// Only registered, enabled languages can be constructed, so code holding a
/// `Language` never needs to re-validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "hi")
    code: &'static str,
}

impl Language {
    /// English, the identity language.
    pub const ENGLISH: Language = Language { code: "en" };

    /// Hindi.
    pub const HINDI: Language = Language { code: "hi" };

    /// Marathi.
    pub const MARATHI: Language = Language { code: "mr" };

    /// Create a Language from a language code string.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code (e.g., "en", "hi")
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is registered and enabled
    /// * `Err` if the code is unknown or the language is disabled
    pub fn from_code(code: &str) -> Result<Language> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language {
                code: config.code, // use the static str from the registry
            }),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// The identity (source) language.
    ///
    /// Text in this language is the source text itself and is never cached
    /// or sent to the translation backend.
    pub fn identity() -> Language {
        let config = LanguageRegistry::get().identity();
        Language { code: config.code }
    }

    /// The ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is not in the registry, which cannot happen for a
    /// `Language` constructed through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// The English name of the language.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// The native name of the language.
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Check whether this is the identity language.
    pub fn is_identity(&self) -> bool {
        self.config().is_identity
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
