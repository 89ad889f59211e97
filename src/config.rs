use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    // Translation backend
    pub backend_base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,

    // Local state
    pub data_dir: PathBuf,
    pub default_language: String,
}

impl StoreConfig {
    /// Build a config for an explicit backend URL with defaults elsewhere.
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Self {
            backend_base_url: backend_base_url.into(),
            api_key: None,
            request_timeout_secs: 10,
            data_dir: PathBuf::from("./data"),
            default_language: "en".to_string(),
        }
    }

    /// Set the data directory holding the snapshot file.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the bearer token sent to the translation backend.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the language used when no snapshot exists.
    pub fn with_default_language(mut self, code: impl Into<String>) -> Self {
        self.default_language = code.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Translation backend
            backend_base_url: std::env::var("LANGSTORE_BACKEND_URL")
                .context("LANGSTORE_BACKEND_URL not set")?,
            api_key: std::env::var("LANGSTORE_API_KEY").ok(),
            request_timeout_secs: std::env::var("LANGSTORE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Local state
            data_dir: std::env::var("LANGSTORE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            default_language: std::env::var("LANGSTORE_DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
        })
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
