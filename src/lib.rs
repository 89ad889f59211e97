//! Client-side language state for the workshop booking app.
//!
//! Every user-facing string in the app ships in English and is translated
//! on demand through a backend service. This crate owns that flow: a
//! restart-safe cache of resolved translations, a coordinator that serializes
//! language switches and batch prefetches, and small binding types for call
//! sites that display one string or warm a screen's worth of them.
//!
//! Resolution never fails outward. When the service is down, a string
//! resolves to its English source text (or an explicit fallback) and the
//! failure is recorded on the store for the settings screen to surface.
//!
//! Typical wiring:
//!
//! ```no_run
//! use language_store::{bootstrap, StoreConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = StoreConfig::from_env()?;
//! let store = bootstrap::init_http(&config).await?;
//!
//! let greeting = store.translate("home.greeting", "Need a hand?", None).await;
//! println!("{greeting}");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod hooks;
pub mod http;
pub mod language;
pub mod metrics;
pub mod persist;
pub mod retry;
pub mod store;
pub mod validator;

pub use backend::{BackendError, TranslationBackend};
pub use config::StoreConfig;
pub use hooks::{BatchWarmer, LanguageHandle, TranslationBinding};
pub use http::HttpBackend;
pub use language::{Language, LanguageConfig, LanguageRegistry};
pub use metrics::{MetricsReport, StoreMetrics};
pub use store::{BatchItem, LanguageStore};
