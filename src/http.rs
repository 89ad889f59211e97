//! HTTP implementation of the translation backend.
//!
//! Talks JSON to the translation service. Transient failures (429, 5xx,
//! network) are retried with exponential backoff; other client errors fail
//! fast so a misconfigured request does not burn the retry budget.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, TranslationBackend};
use crate::config::StoreConfig;
use crate::language::Language;
use crate::retry::{with_retry_if, RetryConfig};

/// Single-text translation request
#[derive(Debug, Serialize)]
struct TranslateRequest {
    text: String,
    target: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translation: Option<String>,
}

/// Positional batch translation request
#[derive(Debug, Serialize)]
struct BatchTranslateRequest {
    texts: Vec<String>,
    target: String,
}

#[derive(Debug, Deserialize)]
struct BatchTranslateResponse {
    #[serde(default)]
    translations: Vec<Option<String>>,
}

/// Translation backend speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Build a backend from config.
    ///
    /// The HTTP client carries the configured request timeout; individual
    /// calls add retries on top of it.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client for translation backend")?;

        Ok(Self {
            client,
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// POST a JSON body and return the checked response.
    async fn post_json<B: Serialize>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, BackendError> {
        let mut request = self.client.post(format!("{}{}", self.base_url, endpoint));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(BackendError::Service { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl TranslationBackend for HttpBackend {
    async fn translate(&self, text: &str, target: Language) -> Result<String, BackendError> {
        let request = TranslateRequest {
            text: text.to_string(),
            target: target.code().to_string(),
        };

        with_retry_if(
            &RetryConfig::api_call(),
            &format!("Translate to {}", target.code()),
            || async {
                let response = self
                    .post_json("/api/translate", Some(&request))
                    .await?
                    .json::<TranslateResponse>()
                    .await?;

                let translated = response.translation.unwrap_or_default();
                if translated.trim().is_empty() {
                    return Err(BackendError::EmptyResult);
                }
                Ok(translated)
            },
            BackendError::is_retryable,
        )
        .await
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target: Language,
    ) -> Result<Vec<Option<String>>, BackendError> {
        let request = BatchTranslateRequest {
            texts: texts.to_vec(),
            target: target.code().to_string(),
        };

        with_retry_if(
            &RetryConfig::api_call(),
            &format!("Batch translate to {}", target.code()),
            || async {
                let response = self
                    .post_json("/api/translate/batch", Some(&request))
                    .await?
                    .json::<BatchTranslateResponse>()
                    .await?;

                // Some service versions send "" instead of null for misses
                let normalized = response
                    .translations
                    .into_iter()
                    .map(|entry| entry.filter(|text| !text.trim().is_empty()))
                    .collect();
                Ok(normalized)
            },
            BackendError::is_retryable,
        )
        .await
    }

    async fn load_cached_translations(&self) -> Result<(), BackendError> {
        with_retry_if(
            &RetryConfig::cache_sync(),
            "Hydrate service translation cache",
            || async {
                self.post_json::<()>("/api/translations/hydrate", None)
                    .await?;
                Ok(())
            },
            BackendError::is_retryable,
        )
        .await
    }

    async fn clear_cache(&self) -> Result<(), BackendError> {
        with_retry_if(
            &RetryConfig::cache_sync(),
            "Purge service translation cache",
            || async {
                self.post_json::<()>("/api/translations/purge", None).await?;
                Ok(())
            },
            BackendError::is_retryable,
        )
        .await
    }
}
