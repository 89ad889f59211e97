//! Language coordination store.
//!
//! `LanguageStore` owns the current language, the translation cache, the
//! last backend error, and the durable snapshot. It is an explicit object:
//! callers construct one (usually through `bootstrap::init`), wrap it in an
//! `Arc`, and hand it to whoever needs it. Nothing here is a process-wide
//! singleton, so tests and tools can run several isolated stores side by
//! side.
//!
//! Concurrency model: state lives behind a `std::sync::RwLock` whose guards
//! are never held across an await point. Backend calls and snapshot writes
//! happen with no lock held; results are applied under the language captured
//! *before* the call, so a language switch mid-flight can never write into
//! the wrong slot. The loading indicator is a plain counter of in-flight
//! backend resolutions, raised on entry and lowered by a drop guard on every
//! exit path. Consumers watch a revision channel that ticks on every
//! observable change.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use std::collections::HashMap;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, TranslationBackend};
use crate::cache::TranslationCache;
use crate::language::Language;
use crate::metrics::StoreMetrics;
use crate::persist::{PersistedState, SnapshotFile};
use crate::validator::TranslationValidator;

/// One entry of a batch translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Translation key, e.g. `"signup.title"`
    pub key: String,
    /// Source text in the identity language
    pub text: String,
}

impl BatchItem {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Mutable store state guarded by the lock.
struct StoreState {
    current_language: Language,
    cache: TranslationCache,
    last_error: Option<String>,
}

/// Coordinator for the current language and its translation cache.
pub struct LanguageStore {
    state: RwLock<StoreState>,
    backend: Arc<dyn TranslationBackend>,
    snapshot: Option<SnapshotFile>,
    in_flight: AtomicUsize,
    metrics: StoreMetrics,
    revision: watch::Sender<u64>,
}

/// Raises the in-flight counter on creation and lowers it on drop, ticking
/// the revision channel both times. Dropping on every exit path keeps the
/// counter truthful even when a resolution fails.
struct FlightGuard<'a> {
    store: &'a LanguageStore,
}

impl<'a> FlightGuard<'a> {
    fn enter(store: &'a LanguageStore) -> Self {
        store.in_flight.fetch_add(1, Ordering::SeqCst);
        store.notify();
        Self { store }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.store.notify();
    }
}

impl LanguageStore {
    /// Create a store with an empty cache and the identity language current.
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self::with_state(backend, Language::identity(), TranslationCache::new(), None)
    }

    /// Create a store from restored state.
    ///
    /// `snapshot` is where future mutations are persisted; pass `None` for a
    /// purely in-memory store.
    pub fn with_state(
        backend: Arc<dyn TranslationBackend>,
        current_language: Language,
        cache: TranslationCache,
        snapshot: Option<SnapshotFile>,
    ) -> Self {
        let (revision, _) = watch::channel(0u64);
        Self {
            state: RwLock::new(StoreState {
                current_language,
                cache,
                last_error: None,
            }),
            backend,
            snapshot,
            in_flight: AtomicUsize::new(0),
            metrics: StoreMetrics::new(),
            revision,
        }
    }

    // Lock helpers; a guard from a panicked holder is still usable.
    fn state_read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    /// The language currently selected.
    pub fn current_language(&self) -> Language {
        self.state_read().current_language
    }

    /// Whether any backend resolution is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The most recent backend error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.state_read().last_error.clone()
    }

    /// Probe the cache without triggering resolution.
    pub fn cached(&self, key: &str, language: Language) -> Option<String> {
        self.state_read().cache.get(key, language)
    }

    /// Number of translation keys currently cached.
    pub fn cache_len(&self) -> usize {
        self.state_read().cache.len()
    }

    /// This store's metrics counters.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Subscribe to the revision channel.
    ///
    /// The value ticks on every observable change: language switches, cache
    /// writes, error updates, and loading transitions. Receivers should
    /// treat a tick as "re-read whatever you display".
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Resolve one translation. Never fails.
    ///
    /// Identity language returns the source text untouched, with no cache or
    /// backend traffic. A cached translation returns without a backend call.
    /// Otherwise the backend is asked once (with retries inside the backend);
    /// on success the result is cached under the language that was current
    /// when the call started, on failure the error is recorded and the caller
    /// gets `fallback` or the source text back.
    pub async fn translate(&self, key: &str, text: &str, fallback: Option<&str>) -> String {
        let language = self.current_language();

        if language.is_identity() {
            return text.to_string();
        }

        let cached = {
            let state = self.state_read();
            state.cache.get(key, language)
        };
        if let Some(found) = cached {
            self.metrics.record_cache_hit();
            debug!(key = key, language = %language, "Cache hit");
            return found;
        }

        self.metrics.record_cache_miss();
        let _flight = FlightGuard::enter(self);
        self.metrics.record_backend_call();

        let outcome = self
            .backend
            .translate(text, language)
            .await
            .and_then(|translated| {
                // A blank success is a miss in disguise
                if translated.trim().is_empty() {
                    Err(BackendError::EmptyResult)
                } else {
                    Ok(translated)
                }
            });

        match outcome {
            Ok(translated) => {
                let validation = TranslationValidator::validate(text, &translated);
                if validation.has_warnings() {
                    warn!(
                        key = key,
                        language = %language,
                        warnings = ?validation.warnings,
                        "Translation validation warnings"
                    );
                }

                {
                    let mut state = self.state_write();
                    state.cache.insert(key, language, &translated);
                }
                self.persist_snapshot().await;
                debug!(key = key, language = %language, "Translation resolved");
                translated
            }
            Err(err) => {
                self.metrics.record_backend_failure();
                warn!(
                    key = key,
                    language = %language,
                    error = %err,
                    "Translation failed, falling back"
                );
                {
                    let mut state = self.state_write();
                    state.last_error = Some(err.to_string());
                }
                match fallback {
                    Some(fallback) => fallback.to_string(),
                    None => text.to_string(),
                }
            }
        }
    }

    /// Resolve a whole list of translations in one backend request.
    ///
    /// A cache-warming operation: nothing is returned, the results land in
    /// the cache as a single atomic merge. The response is matched to the
    /// request by position; indexes the service answered with nothing are
    /// merged carrying their source text, so every requested key reads as
    /// cached afterwards instead of falling through to one individual
    /// request per key. A failed batch leaves the cache exactly as it was
    /// and records the error.
    pub async fn translate_batch(&self, items: &[BatchItem]) {
        if items.is_empty() {
            return;
        }

        let language = self.current_language();
        if language.is_identity() {
            debug!("Batch translation skipped for identity language");
            return;
        }

        let _flight = FlightGuard::enter(self);
        self.metrics.record_backend_call();

        let texts: Vec<String> = items.iter().map(|item| item.text.clone()).collect();

        match self.backend.translate_batch(&texts, language).await {
            Ok(results) => {
                let mut pairs: HashMap<String, String> = HashMap::new();
                let mut source_filled = 0usize;
                for (index, item) in items.iter().enumerate() {
                    let translated = results
                        .get(index)
                        .and_then(|slot| slot.as_deref())
                        .filter(|text| !text.trim().is_empty());

                    match translated {
                        Some(translated) => {
                            let validation =
                                TranslationValidator::validate(&item.text, translated);
                            if validation.has_warnings() {
                                warn!(
                                    key = %item.key,
                                    language = %language,
                                    warnings = ?validation.warnings,
                                    "Translation validation warnings"
                                );
                            }
                            pairs.insert(item.key.clone(), translated.to_string());
                        }
                        // An empty slot still merges, pinned to its source
                        // text; the key must not stay a cache miss.
                        None => {
                            source_filled += 1;
                            pairs.insert(item.key.clone(), item.text.clone());
                        }
                    }
                }

                let merged = {
                    let mut state = self.state_write();
                    state.cache.merge(language, pairs)
                };
                self.persist_snapshot().await;
                debug!(
                    language = %language,
                    requested = items.len(),
                    merged = merged,
                    source_filled = source_filled,
                    "Batch translation resolved"
                );
            }
            Err(err) => {
                self.metrics.record_backend_failure();
                warn!(
                    language = %language,
                    items = items.len(),
                    error = %err,
                    "Batch translation failed, cache untouched"
                );
                let mut state = self.state_write();
                state.last_error = Some(err.to_string());
            }
        }
    }

    /// Switch the current language.
    ///
    /// Clears the recorded error, leaves every cached translation in place,
    /// and asks the backend to warm its own cache for the new language.
    /// Idempotent; hydration failures are logged, never surfaced.
    pub async fn set_language(&self, language: Language) {
        {
            let mut state = self.state_write();
            state.current_language = language;
            state.last_error = None;
        }
        info!(language = %language, "Language changed");
        self.notify();

        self.persist_snapshot().await;

        if let Err(err) = self.backend.load_cached_translations().await {
            warn!(
                language = %language,
                error = %err,
                "Service cache hydration failed"
            );
        }
    }

    /// Drop every cached translation.
    ///
    /// Keeps the current language, clears the recorded error, and asks the
    /// backend to purge its own cache. Purge failures are logged, never
    /// surfaced.
    pub async fn clear_translations(&self) {
        {
            let mut state = self.state_write();
            state.cache.clear();
            state.last_error = None;
        }
        info!("Translation cache cleared");
        self.notify();

        self.persist_snapshot().await;

        if let Err(err) = self.backend.clear_cache().await {
            warn!(error = %err, "Service cache purge failed");
        }
    }

    /// Write the whole current state to the snapshot file, if one is
    /// configured. Failures are logged and swallowed: persistence is
    /// best-effort and must never fail a resolution.
    async fn persist_snapshot(&self) {
        let snapshot = match &self.snapshot {
            Some(snapshot) => snapshot,
            None => return,
        };

        let record = {
            let state = self.state_read();
            PersistedState::new(state.current_language.code(), state.cache.to_persisted())
        };

        if let Err(err) = snapshot.save(&record).await {
            warn!(error = %err, "Failed to persist language store snapshot");
        }
    }
}
