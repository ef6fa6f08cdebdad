//! Configuration for the embedding client and batch scheduler.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_DIMENSION;
use crate::error::{EmbeddingError, Result};

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings shared by the embedding client and the batch scheduler.
///
/// Built once at startup and passed by reference into the components that
/// need it. The credential is never read from or written to config files.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Bearer token for the embedding API.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// API base URL; requests go to `{base_url}/embeddings`.
    pub base_url: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Dimension every accepted embedding must have.
    pub dimension: usize,

    /// Total timeout for one network call, in seconds.
    pub request_timeout_secs: u64,

    /// Attempts per chunk in the batch path, including the first one.
    pub max_attempts: u32,

    /// Backoff step in milliseconds; attempt `n` failing waits `n * step`.
    pub backoff_step_ms: u64,

    /// Maximum number of in-flight network calls in the batch path.
    pub concurrency: usize,
}

impl EmbedderConfig {
    /// Create a configuration with default values and the given credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Create a configuration with the credential taken from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.load_api_key_from_env()?;
        Ok(config)
    }

    /// Fill in the credential from `OPENAI_API_KEY`.
    pub fn load_api_key_from_env(&mut self) -> Result<()> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                self.api_key = Some(key.trim().to_string());
                Ok(())
            }
            _ => Err(EmbeddingError::MissingCredential(API_KEY_ENV.to_string())),
        }
    }

    /// Parse non-secret settings from a TOML document.
    ///
    /// Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| EmbeddingError::Config(e.to_string()))
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the expected embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the backoff step.
    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step_ms = step.as_millis() as u64;
        self
    }

    /// Set the concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the attempt cap.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    /// Check the settings that would otherwise fail deep inside a batch run.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EmbeddingError::Config("concurrency must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(EmbeddingError::Config("max_attempts must be at least 1".into()));
        }
        if self.dimension == 0 {
            return Err(EmbeddingError::Config("dimension must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(EmbeddingError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-ada-002".to_string(),
            dimension: DEFAULT_DIMENSION,
            request_timeout_secs: 10,
            max_attempts: 3,
            backoff_step_ms: 500,
            concurrency: 5,
        }
    }
}

impl fmt::Debug for EmbedderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_step_ms", &self.backoff_step_ms)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
