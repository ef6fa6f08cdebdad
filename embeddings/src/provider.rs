//! Embedding providers.
//!
//! A provider turns one text payload into one embedding. Building the request
//! is split from sending it so callers can do the former without holding a
//! concurrency slot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Embedding;
use crate::config::{API_KEY_ENV, EmbedderConfig};
use crate::error::{EmbeddingError, Result};

/// Longest response body excerpt kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// A fully built request, ready to be sent (and re-sent) without further
    /// preparation.
    type Request: Send + 'static;

    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the model this provider requests.
    fn model(&self) -> &str;

    /// Build the request for `text`. Performs no I/O.
    fn prepare(&self, text: &str) -> Result<Self::Request>;

    /// Send a prepared request, retrying failed attempts with linear backoff.
    async fn embed_with_retry(&self, request: Self::Request) -> Result<Embedding>;

    /// Embed `text` with a single attempt.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// OpenAI-compatible embedding provider.
pub struct OpenAIProvider {
    /// HTTP client carrying the auth header and the per-call timeout.
    client: reqwest::Client,

    /// Full embeddings endpoint.
    endpoint: String,

    model: String,

    max_attempts: u32,

    backoff_step: Duration,
}

/// A serialized embeddings request body.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    body: Vec<u8>,
}

impl OpenAIProvider {
    /// Create a provider from configuration.
    ///
    /// Fails when the configuration carries no usable API key.
    pub fn new(config: &EmbedderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| EmbeddingError::MissingCredential(API_KEY_ENV.to_string()))?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| EmbeddingError::Config("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_attempts: config.max_attempts.max(1),
            backoff_step: config.backoff_step(),
        })
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    async fn send(&self, request: &PreparedRequest) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&self.endpoint)
            .body(request.body.clone())
            .send()
            .await
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    type Request = PreparedRequest;

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn prepare(&self, text: &str) -> Result<PreparedRequest> {
        let body = serde_json::to_vec(&OpenAIEmbeddingRequest {
            input: text,
            model: &self.model,
        })?;
        Ok(PreparedRequest { body })
    }

    async fn embed_with_retry(&self, request: PreparedRequest) -> Result<Embedding> {
        let mut attempt = 1;
        let response = loop {
            let failure = match self.send(&request).await {
                Ok(response) if response.status().is_success() => break response,
                Ok(response) => {
                    let status = response.status().as_u16();
                    // Drain so the connection goes back to the pool.
                    let body = response.bytes().await.unwrap_or_default();
                    EmbeddingError::Status {
                        status,
                        body: truncate_body(&String::from_utf8_lossy(&body)),
                    }
                }
                Err(e) => EmbeddingError::Http(e),
            };

            if attempt >= self.max_attempts {
                warn!(attempt, "Giving up after {attempt} attempts: {failure}");
                return Err(failure);
            }

            let wait = self.backoff(attempt);
            warn!(
                attempt,
                wait_ms = wait.as_millis() as u64,
                "Retrying: {failure}"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        };

        let body = response.bytes().await?;
        decode_embedding(&body)
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = self.prepare(text)?;
        let response = self.send(&request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response.bytes().await?;
        let embedding = decode_embedding(&body)?;
        debug!("Embedded query with {} dimensions", embedding.len());
        Ok(embedding)
    }
}

/// Take `data[0].embedding` out of an embeddings response body.
fn decode_embedding(body: &[u8]) -> Result<Embedding> {
    let result: OpenAIEmbeddingResponse = serde_json::from_slice(body)
        .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

    result
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .ok_or(EmbeddingError::EmptyResponse)
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Embedding,
}
