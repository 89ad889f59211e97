//! In-memory translation cache.
//!
//! Maps a translation key (namespaced dot notation, e.g. `"signup.title"`) to
//! per-language translated text. The identity language is never stored: its
//! "translation" is the source text itself, so caching it would only
//! duplicate every string.
//!
//! The cache is a plain data structure with no interior locking; the store
//! wraps it in a lock and keeps critical sections short. Batch results are
//! merged through [`TranslationCache::merge`] in a single call so a batch
//! lands either whole or not at all.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::language::Language;

/// Cache of translated strings, keyed by translation key and then language.
#[derive(Debug, Default, Clone)]
pub struct TranslationCache {
    entries: HashMap<String, HashMap<Language, String>>,
}

impl TranslationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached translation for a key in one language.
    pub fn get(&self, key: &str, language: Language) -> Option<String> {
        self.entries
            .get(key)
            .and_then(|slots| slots.get(&language))
            .cloned()
    }

    /// Check whether a translation is cached without cloning it.
    pub fn contains(&self, key: &str, language: Language) -> bool {
        self.entries
            .get(key)
            .map(|slots| slots.contains_key(&language))
            .unwrap_or(false)
    }

    /// Insert a single translation. Last writer wins per slot.
    ///
    /// Identity-language writes are ignored: the identity language reads
    /// straight from source text.
    pub fn insert(&mut self, key: &str, language: Language, text: &str) {
        if language.is_identity() {
            warn!(
                key = key,
                language = %language,
                "Refusing to cache identity-language entry"
            );
            return;
        }

        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(language, text.to_string());
    }

    /// Merge a batch of key → translated-text pairs for one language.
    ///
    /// A single mutation: either every pair in `pairs` lands or none does.
    /// Returns the number of slots written (zero when the batch is refused
    /// for the identity language).
    pub fn merge(&mut self, language: Language, pairs: HashMap<String, String>) -> usize {
        if language.is_identity() {
            warn!(
                language = %language,
                pairs = pairs.len(),
                "Refusing to cache identity-language batch"
            );
            return 0;
        }

        let count = pairs.len();
        for (key, text) in pairs {
            self.entries.entry(key).or_default().insert(language, text);
        }
        count
    }

    /// Remove every cached translation for every key.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of translation keys with at least one cached language.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no keys at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys cached for one language.
    pub fn language_len(&self, language: Language) -> usize {
        self.entries
            .values()
            .filter(|slots| slots.contains_key(&language))
            .count()
    }

    /// Iterate over the cached translation keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Snapshot the cache as string-keyed sorted maps for persistence.
    ///
    /// Sorted maps keep the serialized form stable across runs.
    pub fn to_persisted(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.entries
            .iter()
            .map(|(key, slots)| {
                let by_code: BTreeMap<String, String> = slots
                    .iter()
                    .map(|(language, text)| (language.code().to_string(), text.clone()))
                    .collect();
                (key.clone(), by_code)
            })
            .collect()
    }

    /// Rebuild a cache from a persisted snapshot.
    ///
    /// Language codes that are unknown, disabled, or the identity language
    /// are dropped with a warning rather than failing the whole load; a stale
    /// snapshot must never prevent startup.
    pub fn from_persisted(persisted: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let mut entries: HashMap<String, HashMap<Language, String>> = HashMap::new();
        let mut dropped = 0usize;

        for (key, by_code) in persisted {
            for (code, text) in by_code {
                let language = match Language::from_code(code) {
                    Ok(language) if language.is_identity() => {
                        dropped += 1;
                        continue;
                    }
                    Ok(language) => language,
                    Err(_) => {
                        dropped += 1;
                        continue;
                    }
                };

                entries
                    .entry(key.clone())
                    .or_default()
                    .insert(language, text.clone());
            }
        }

        if dropped > 0 {
            warn!(
                dropped = dropped,
                "Dropped unusable language slots from persisted snapshot"
            );
        }

        TranslationCache { entries }
    }
}
