//! Answer questions by handing the best matching chunks to a chat model.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use repoqa_embeddings::{EmbedderConfig, ScoredChunk};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::query;

const SYSTEM_PROMPT: &str = "You are a senior engineer answering questions about a codebase. \
Use only the provided code snippets to answer. If code reveals config, structure, or usage \
patterns, summarize those clearly. Do not guess or include general explanations unless they \
are directly inferred from the code.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// System instructions plus the question with every chunk's file and code.
pub fn build_prompt(question: &str, chunks: &[ScoredChunk]) -> Vec<ChatMessage> {
    let mut prompt = format!("Question: {question}\n\nRelevant Code:\n\n");
    for chunk in chunks {
        prompt.push_str(&format!("\n---\nFile: {}\n{}\n", chunk.file, chunk.code));
    }

    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: prompt,
        },
    ]
}

/// Minimal client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl ChatClient {
    pub fn new(
        config: &EmbedderConfig,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = config.api_key.as_deref().unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: model.into(),
        })
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("failed to call chat completions")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(200).collect();
            bail!("OpenAI API error {}: {excerpt}", status.as_u16());
        }

        let parsed: ChatResponse = resp.json().await.context("failed to parse chat response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("chat response contained no answer")
    }
}

pub async fn run(
    config: &EmbedderConfig,
    index_path: &Path,
    question: &str,
    top: usize,
    model: &str,
    timeout: Duration,
) -> Result<()> {
    if question.trim().is_empty() {
        bail!("You must provide a question.\nUsage: repoqa ask \"What does the parser do?\"");
    }
    println!("Query: \"{question}\"");

    let chunks = query::search(config, index_path, question, top).await?;
    println!("Found {} relevant chunks", chunks.len());
    if chunks.is_empty() {
        bail!("no indexed chunks to answer from; run `repoqa embed` first");
    }

    let messages = build_prompt(question, &chunks);
    let client = ChatClient::new(config, model, timeout)?;
    let answer = client.complete(&messages).await?;
    info!(model, "Answer received");

    println!("\nAnswer:\n");
    println!("{answer}");
    Ok(())
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
