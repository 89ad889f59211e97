//! Translation backend contract.
//!
//! The store never talks to the network directly; it goes through this trait
//! so production code can use the HTTP client while tests swap in counting
//! mocks. Implementations must be `Send + Sync`: the store shares one
//! backend behind an `Arc` across concurrent resolutions.

use async_trait::async_trait;
use thiserror::Error;

use crate::language::Language;

/// Errors surfaced by a translation backend.
///
/// Callers above the store never see these: the store converts every variant
/// into a recorded error string plus a fallback value.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service could not be reached or the response could not be read.
    #[error("translation service unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("translation service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// The service answered successfully but carried no usable translation.
    #[error("translation service returned no usable translation")]
    EmptyResult,
}

impl BackendError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Rate limits and server errors are transient; client errors and empty
    /// results would just repeat.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(err) => !err.is_decode(),
            BackendError::Service { status, .. } => *status == 429 || *status >= 500,
            BackendError::EmptyResult => false,
        }
    }
}

/// A service that translates source-language text into a target language.
///
/// `target` is always a non-identity language: the store short-circuits
/// identity-language requests before they reach the backend.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate a single piece of text.
    async fn translate(&self, text: &str, target: Language) -> Result<String, BackendError>;

    /// Translate an ordered list of texts in one request.
    ///
    /// The result is positionally aligned with `texts`; `None` at an index
    /// means the service had no translation for that entry.
    async fn translate_batch(
        &self,
        texts: &[String],
        target: Language,
    ) -> Result<Vec<Option<String>>, BackendError>;

    /// Ask the service to warm its own translation cache.
    ///
    /// Invoked at startup and after every language switch. The call is
    /// opaque: nothing flows back to the store.
    async fn load_cached_translations(&self) -> Result<(), BackendError>;

    /// Ask the service to drop its cached translations.
    async fn clear_cache(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Retryability ====================

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = BackendError::Service {
            status: 429,
            message: "too many requests".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        for status in [500, 502, 503] {
            let err = BackendError::Service {
                status,
                message: "server error".to_string(),
            };
            assert!(err.is_retryable(), "status {} should be retryable", status);
        }
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404] {
            let err = BackendError::Service {
                status,
                message: "client error".to_string(),
            };
            assert!(!err.is_retryable(), "status {} should not be retryable", status);
        }
    }

    #[test]
    fn test_empty_result_is_not_retryable() {
        assert!(!BackendError::EmptyResult.is_retryable());
    }

    // ==================== Display ====================

    #[test]
    fn test_service_error_display_includes_status() {
        let err = BackendError::Service {
            status: 503,
            message: "maintenance".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("maintenance"));
    }

    #[test]
    fn test_empty_result_display() {
        let text = BackendError::EmptyResult.to_string();
        assert!(text.contains("no usable translation"));
    }
}
