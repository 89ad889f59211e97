//! Store construction at app start.
//!
//! [`init`] rebuilds a [`LanguageStore`] from the persisted snapshot, so a
//! user who picked Hindi yesterday opens the app in Hindi today with their
//! cached translations already in place. Anything unusable on disk (missing
//! file, unknown schema version, corrupt JSON, a language that is no longer
//! enabled) degrades to defaults with a warning; startup itself never fails
//! on snapshot problems, only on misconfiguration.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::backend::TranslationBackend;
use crate::cache::TranslationCache;
use crate::config::StoreConfig;
use crate::http::HttpBackend;
use crate::language::Language;
use crate::persist::SnapshotFile;
use crate::store::LanguageStore;

/// Build a store from config and a backend, restoring persisted state.
///
/// The backend's own cache is hydrated at the end; a hydration failure is
/// logged and ignored, since the store works fine without it.
pub async fn init(
    config: &StoreConfig,
    backend: Arc<dyn TranslationBackend>,
) -> Result<Arc<LanguageStore>> {
    let snapshot = SnapshotFile::in_dir(&config.data_dir);

    let persisted = match snapshot.load().await {
        Ok(persisted) => persisted,
        Err(error) => {
            warn!("Could not read language snapshot: {:#}. Starting fresh", error);
            None
        }
    };

    let (language, cache) = match persisted {
        Some(persisted) => {
            let language = match Language::from_code(&persisted.current_language) {
                Ok(language) => language,
                Err(error) => {
                    let fallback = configured_default(config);
                    warn!(
                        "Persisted language is unusable: {:#}. Using '{}'",
                        error, fallback
                    );
                    fallback
                }
            };
            let cache = TranslationCache::from_persisted(&persisted.translations);
            info!(
                language = %language,
                cached_keys = cache.len(),
                "Restored persisted language state"
            );
            (language, cache)
        }
        None => {
            let language = configured_default(config);
            info!(language = %language, "No usable snapshot, starting with defaults");
            (language, TranslationCache::new())
        }
    };

    let store = Arc::new(LanguageStore::with_state(
        Arc::clone(&backend),
        language,
        cache,
        Some(snapshot),
    ));

    if let Err(error) = backend.load_cached_translations().await {
        warn!("Service translation cache hydration failed: {}", error);
    }

    Ok(store)
}

/// [`init`] wired to the HTTP translation service from the same config.
pub async fn init_http(config: &StoreConfig) -> Result<Arc<LanguageStore>> {
    let backend = Arc::new(HttpBackend::new(config)?);
    init(config, backend).await
}

/// The configured default language, or the identity language if the config
/// names a code the registry does not enable.
fn configured_default(config: &StoreConfig) -> Language {
    match Language::from_code(&config.default_language) {
        Ok(language) => language,
        Err(error) => {
            warn!(
                "Configured default language is unusable: {:#}. Using '{}'",
                error,
                Language::identity()
            );
            Language::identity()
        }
    }
}
