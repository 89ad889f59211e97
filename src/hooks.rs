//! Per-call-site consumers of the language store.
//!
//! Three small front-ends cover the ways UI code consumes the store:
//!
//! - [`TranslationBinding`]: one displayed string. Holds the source text and
//!   the currently displayed resolution, re-resolvable whenever the store
//!   revision ticks. Every binding carries a generation counter: swapping
//!   the source text bumps it, and a resolution that started under an older
//!   generation is discarded instead of overwriting the newer text.
//! - [`BatchWarmer`]: prefetches a list of keys into the cache, firing once
//!   per distinct (item list, language) combination.
//! - [`LanguageHandle`]: language switching and cache clearing pass-throughs
//!   plus registry introspection.
//!
//! All three are cheap to construct and share the store through an `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::language::{Language, LanguageConfig, LanguageRegistry};
use crate::store::{BatchItem, LanguageStore};

/// Source and display state of one binding.
struct BindingState {
    key: String,
    text: String,
    fallback: Option<String>,
    display: String,
}

/// One translated string bound to a call site.
pub struct TranslationBinding {
    store: Arc<LanguageStore>,
    state: Mutex<BindingState>,
    generation: AtomicU64,
    revision: tokio::sync::Mutex<tokio::sync::watch::Receiver<u64>>,
}

impl TranslationBinding {
    /// Create a binding for a key and its source text.
    ///
    /// The displayed text starts as the source text and stays readable at
    /// every moment; resolution only ever upgrades it.
    pub fn new(
        store: Arc<LanguageStore>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let revision = store.subscribe();
        Self {
            store,
            state: Mutex::new(BindingState {
                key: key.into(),
                display: text.clone(),
                text,
                fallback: None,
            }),
            generation: AtomicU64::new(0),
            revision: tokio::sync::Mutex::new(revision),
        }
    }

    /// Set the text displayed when resolution fails.
    ///
    /// Without a fallback, failures display the source text.
    pub fn with_fallback(self, fallback: impl Into<String>) -> Self {
        self.state_lock().fallback = Some(fallback.into());
        self
    }

    fn state_lock(&self) -> MutexGuard<'_, BindingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The text this call site should display right now.
    pub fn text(&self) -> String {
        self.state_lock().display.clone()
    }

    /// The translation key this binding resolves.
    pub fn key(&self) -> String {
        self.state_lock().key.clone()
    }

    /// Whether the store has any resolution in flight.
    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// The store's last recorded error, if any.
    pub fn error(&self) -> Option<String> {
        self.store.last_error()
    }

    /// The store's current language.
    pub fn current_language(&self) -> Language {
        self.store.current_language()
    }

    /// Run one resolution pass and apply the outcome.
    ///
    /// The outcome is applied only if the binding's source has not changed
    /// since this pass started; a stale resolution is discarded so it can
    /// never overwrite newer text.
    pub async fn resolve(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let (key, text, fallback) = {
            let state = self.state_lock();
            (state.key.clone(), state.text.clone(), state.fallback.clone())
        };

        let resolved = self.store.translate(&key, &text, fallback.as_deref()).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(key = %key, "Discarding stale resolution");
            return;
        }

        let mut state = self.state_lock();
        state.display = resolved;
    }

    /// Point the binding at a new key and source text.
    ///
    /// The display resets to the new source text and the generation bumps,
    /// invalidating any resolution still in flight for the old source.
    pub fn set_source(&self, key: impl Into<String>, text: impl Into<String>) {
        let mut state = self.state_lock();
        state.key = key.into();
        state.text = text.into();
        state.display = state.text.clone();
        drop(state);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Wait until the store changes in any observable way.
    ///
    /// Callers drive re-resolution loops with this: `changed().await`, then
    /// `resolve().await`, then display `text()`. Ticks that arrived since
    /// the previous call return immediately, so changes are never missed.
    pub async fn changed(&self) {
        let mut revision = self.revision.lock().await;
        // Only fails when the store is gone, and we hold an Arc to it
        let _ = revision.changed().await;
    }
}

/// Tracks which (item list, language) combination was last prefetched.
struct WarmerState {
    items: Vec<BatchItem>,
    last_fired: Option<(Vec<BatchItem>, Language)>,
}

/// Prefetches a list of translations into the cache.
pub struct BatchWarmer {
    store: Arc<LanguageStore>,
    state: Mutex<WarmerState>,
}

impl BatchWarmer {
    pub fn new(store: Arc<LanguageStore>, items: Vec<BatchItem>) -> Self {
        Self {
            store,
            state: Mutex::new(WarmerState {
                items,
                last_fired: None,
            }),
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, WarmerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the item list. The next `sync` fires if it differs from the
    /// last combination fired.
    pub fn set_items(&self, items: Vec<BatchItem>) {
        self.state_lock().items = items;
    }

    /// Fire the batch request if the (item list, language) combination has
    /// not been fired yet.
    ///
    /// The combination is marked fired before the request goes out, so
    /// concurrent `sync` calls cannot double-fire it. A failed batch counts
    /// as fired; the next language switch or item change retriggers it.
    pub async fn sync(&self) {
        let language = self.store.current_language();
        let items = {
            let mut state = self.state_lock();
            let signature = (state.items.clone(), language);
            if state.last_fired.as_ref() == Some(&signature) {
                return;
            }
            state.last_fired = Some(signature.clone());
            signature.0
        };

        self.store.translate_batch(&items).await;
    }
}

/// Language switching and registry introspection for settings screens.
pub struct LanguageHandle {
    store: Arc<LanguageStore>,
}

impl LanguageHandle {
    pub fn new(store: Arc<LanguageStore>) -> Self {
        Self { store }
    }

    /// The currently selected language.
    pub fn current(&self) -> Language {
        self.store.current_language()
    }

    /// Every enabled language a user can pick from.
    pub fn available(&self) -> Vec<&'static LanguageConfig> {
        LanguageRegistry::get().list_enabled()
    }

    /// Switch the store to a new language.
    pub async fn change_language(&self, language: Language) {
        self.store.set_language(language).await;
    }

    /// Drop every cached translation.
    pub async fn clear_translations(&self) {
        self.store.clear_translations().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::backend::{BackendError, TranslationBackend};
    use crate::cache::TranslationCache;

    #[derive(Default)]
    struct MockBackend {
        translate_calls: AtomicUsize,
        batch_calls: AtomicUsize,
        fail: AtomicBool,
        delay_ms: AtomicUsize,
    }

    impl MockBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn with_delay_ms(ms: usize) -> Arc<Self> {
            let backend = Self::default();
            backend.delay_ms.store(ms, Ordering::SeqCst);
            Arc::new(backend)
        }
    }

    #[async_trait]
    impl TranslationBackend for MockBackend {
        async fn translate(&self, text: &str, target: Language) -> Result<String, BackendError> {
            self.translate_calls.fetch_add(1, Ordering::SeqCst);
            let ms = self.delay_ms.load(Ordering::SeqCst);
            if ms > 0 {
                tokio::time::sleep(Duration::from_millis(ms as u64)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Service {
                    status: 500,
                    message: "mock failure".to_string(),
                });
            }
            Ok(format!("[{}] {}", target.code(), text))
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            target: Language,
        ) -> Result<Vec<Option<String>>, BackendError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|text| Some(format!("[{}] {}", target.code(), text)))
                .collect())
        }

        async fn load_cached_translations(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn clear_cache(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn store_in_language(backend: Arc<MockBackend>, language: Language) -> Arc<LanguageStore> {
        Arc::new(LanguageStore::with_state(
            backend,
            language,
            TranslationCache::new(),
            None,
        ))
    }

    // ==================== TranslationBinding ====================

    #[tokio::test]
    async fn test_binding_starts_with_source_text() {
        let store = store_in_language(MockBackend::new(), Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        assert_eq!(binding.text(), "Create your account");
        assert_eq!(binding.key(), "signup.title");
    }

    #[tokio::test]
    async fn test_binding_identity_language_keeps_source() {
        let backend = MockBackend::new();
        let store = store_in_language(backend.clone(), Language::ENGLISH);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        binding.resolve().await;

        assert_eq!(binding.text(), "Create your account");
        assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_binding_resolves_translation() {
        let store = store_in_language(MockBackend::new(), Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        binding.resolve().await;

        assert_eq!(binding.text(), "[hi] Create your account");
        assert_eq!(binding.current_language(), Language::HINDI);
    }

    #[tokio::test]
    async fn test_binding_uses_cache_on_second_resolve() {
        let backend = MockBackend::new();
        let store = store_in_language(backend.clone(), Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        binding.resolve().await;
        binding.resolve().await;

        assert_eq!(backend.translate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_binding_failure_falls_back_to_source() {
        let backend = MockBackend::new();
        backend.fail.store(true, Ordering::SeqCst);
        let store = store_in_language(backend, Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        binding.resolve().await;

        assert_eq!(binding.text(), "Create your account");
        assert!(binding.error().is_some());
    }

    #[tokio::test]
    async fn test_binding_failure_uses_fallback() {
        let backend = MockBackend::new();
        backend.fail.store(true, Ordering::SeqCst);
        let store = store_in_language(backend, Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account")
            .with_fallback("Sign up");

        binding.resolve().await;

        assert_eq!(binding.text(), "Sign up");
    }

    #[tokio::test]
    async fn test_set_source_resets_display() {
        let store = store_in_language(MockBackend::new(), Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        binding.resolve().await;
        assert_eq!(binding.text(), "[hi] Create your account");

        binding.set_source("signup.subtitle", "Takes under a minute");
        assert_eq!(binding.text(), "Takes under a minute");
        assert_eq!(binding.key(), "signup.subtitle");
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded() {
        let backend = MockBackend::with_delay_ms(60);
        let store = store_in_language(backend, Language::HINDI);
        let binding = Arc::new(TranslationBinding::new(
            store,
            "signup.title",
            "Create your account",
        ));

        let task = {
            let binding = binding.clone();
            tokio::spawn(async move { binding.resolve().await })
        };

        // Swap the source while the first resolution is still in flight
        tokio::time::sleep(Duration::from_millis(15)).await;
        binding.set_source("signup.subtitle", "Takes under a minute");

        task.await.unwrap();

        // The slow resolution of the old source must not win
        assert_eq!(binding.text(), "Takes under a minute");
    }

    #[tokio::test]
    async fn test_fresh_resolution_after_set_source_applies() {
        let store = store_in_language(MockBackend::new(), Language::HINDI);
        let binding = TranslationBinding::new(store, "signup.title", "Create your account");

        binding.set_source("signup.subtitle", "Takes under a minute");
        binding.resolve().await;

        assert_eq!(binding.text(), "[hi] Takes under a minute");
    }

    #[tokio::test]
    async fn test_changed_wakes_on_store_tick() {
        let store = store_in_language(MockBackend::new(), Language::HINDI);
        let binding = Arc::new(TranslationBinding::new(
            store.clone(),
            "signup.title",
            "Create your account",
        ));

        let waiter = {
            let binding = binding.clone();
            tokio::spawn(async move {
                binding.changed().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.set_language(Language::MARATHI).await;

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("changed() should wake on language switch")
            .unwrap();
    }

    #[tokio::test]
    async fn test_loading_visible_through_binding() {
        let backend = MockBackend::with_delay_ms(50);
        let store = store_in_language(backend, Language::HINDI);
        let binding = Arc::new(TranslationBinding::new(
            store,
            "signup.title",
            "Create your account",
        ));

        assert!(!binding.is_loading());

        let task = {
            let binding = binding.clone();
            tokio::spawn(async move { binding.resolve().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(binding.is_loading());

        task.await.unwrap();
        assert!(!binding.is_loading());
    }

    // ==================== BatchWarmer ====================

    #[tokio::test]
    async fn test_warmer_fires_once_per_combination() {
        let backend = MockBackend::new();
        let store = store_in_language(backend.clone(), Language::HINDI);
        let warmer = BatchWarmer::new(
            store.clone(),
            vec![
                BatchItem::new("services.towing", "Towing"),
                BatchItem::new("services.battery", "Battery"),
            ],
        );

        warmer.sync().await;
        warmer.sync().await;
        warmer.sync().await;

        assert_eq!(backend.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.cached("services.towing", Language::HINDI).as_deref(),
            Some("[hi] Towing")
        );
    }

    #[tokio::test]
    async fn test_warmer_refires_on_language_change() {
        let backend = MockBackend::new();
        let store = store_in_language(backend.clone(), Language::HINDI);
        let warmer = BatchWarmer::new(
            store.clone(),
            vec![BatchItem::new("services.towing", "Towing")],
        );

        warmer.sync().await;
        store.set_language(Language::MARATHI).await;
        warmer.sync().await;

        assert_eq!(backend.batch_calls.load(Ordering::SeqCst), 2);
        assert!(store.cached("services.towing", Language::HINDI).is_some());
        assert!(store.cached("services.towing", Language::MARATHI).is_some());
    }

    #[tokio::test]
    async fn test_warmer_refires_on_item_change() {
        let backend = MockBackend::new();
        let store = store_in_language(backend.clone(), Language::HINDI);
        let warmer = BatchWarmer::new(
            store,
            vec![BatchItem::new("services.towing", "Towing")],
        );

        warmer.sync().await;
        warmer.set_items(vec![
            BatchItem::new("services.towing", "Towing"),
            BatchItem::new("services.battery", "Battery"),
        ]);
        warmer.sync().await;

        assert_eq!(backend.batch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_warmer_identity_language_never_calls_backend() {
        let backend = MockBackend::new();
        let store = store_in_language(backend.clone(), Language::ENGLISH);
        let warmer = BatchWarmer::new(
            store,
            vec![BatchItem::new("services.towing", "Towing")],
        );

        warmer.sync().await;
        warmer.sync().await;

        assert_eq!(backend.batch_calls.load(Ordering::SeqCst), 0);
    }

    // ==================== LanguageHandle ====================

    #[tokio::test]
    async fn test_handle_changes_language() {
        let store = store_in_language(MockBackend::new(), Language::ENGLISH);
        let handle = LanguageHandle::new(store.clone());

        assert_eq!(handle.current(), Language::ENGLISH);
        handle.change_language(Language::HINDI).await;
        assert_eq!(handle.current(), Language::HINDI);
        assert_eq!(store.current_language(), Language::HINDI);
    }

    #[tokio::test]
    async fn test_handle_lists_enabled_languages() {
        let store = store_in_language(MockBackend::new(), Language::ENGLISH);
        let handle = LanguageHandle::new(store);

        let available = handle.available();
        let codes: Vec<&str> = available.iter().map(|config| config.code).collect();
        assert!(codes.contains(&"en"));
        assert!(codes.contains(&"hi"));
        assert!(codes.contains(&"mr"));
        assert!(!codes.contains(&"ta"));
    }

    #[tokio::test]
    async fn test_handle_clears_translations() {
        let store = store_in_language(MockBackend::new(), Language::HINDI);
        store.translate("services.towing", "Towing", None).await;
        assert_eq!(store.cache_len(), 1);

        let handle = LanguageHandle::new(store.clone());
        handle.clear_translations().await;

        assert_eq!(store.cache_len(), 0);
    }
}
