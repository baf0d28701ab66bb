// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Upstream client: one HTTP POST to the backend's generation endpoint,
// buffered or streaming. No retries — a single failure is surfaced
// immediately to the route handler.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Raw byte stream of an in-flight streaming response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

// ---------------------------------------------------------------------------
// Request / wire types
// ---------------------------------------------------------------------------

/// One generation request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Backend model identifier (already resolved through the registry).
    pub model: String,
    /// Fully rendered prompt.
    pub prompt: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from talking to the inference backend.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("backend unreachable: {0}")]
    Connect(String),

    #[error("backend request timed out: {0}")]
    Timeout(String),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("backend response body invalid: {0}")]
    InvalidBody(String),

    #[error("backend stream failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else {
            UpstreamError::Connect(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Trait: UpstreamClient (dependency injection point)
// ---------------------------------------------------------------------------

/// Abstraction over the backend generation API.
///
/// Route handlers hold this as `Arc<dyn UpstreamClient>` so tests can
/// substitute stubs and count invocations.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Buffered mode: wait for the complete response and return its
    /// `response` text.
    async fn generate(&self, request: GenerateRequest) -> Result<String, UpstreamError>;

    /// Streaming mode: return the raw byte stream as soon as the response
    /// headers are in. The body is newline-delimited JSON events.
    async fn generate_stream(&self, request: GenerateRequest)
        -> Result<ByteStream, UpstreamError>;
}

// ---------------------------------------------------------------------------
// Reqwest implementation
// ---------------------------------------------------------------------------

/// `UpstreamClient` backed by reqwest, pointed at an Ollama-compatible
/// `/api/generate` endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    generate_url: String,
    request_timeout: Duration,
}

impl OllamaClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            generate_url: config.generate_url(),
            request_timeout: config.request_timeout,
        }
    }

    async fn post(
        &self,
        request: &GenerateRequest,
        stream: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream,
        };

        let mut req = self.client.post(&self.generate_url).json(&body);
        if !stream {
            // Streaming responses are open-ended; only buffered calls get a
            // total deadline.
            req = req.timeout(self.request_timeout);
        }

        let response = req.send().await.map_err(UpstreamError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl UpstreamClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, UpstreamError> {
        let response = self.post(&request, false).await?;

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidBody(e.to_string()))?;

        reply
            .response
            .ok_or_else(|| UpstreamError::InvalidBody("missing \"response\" field".to_string()))
    }

    async fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> Result<ByteStream, UpstreamError> {
        let response = self.post(&request, true).await?;

        let stream = response
            .bytes_stream()
            .map_err(|e| UpstreamError::Transport(e.to_string()));
        Ok(Box::pin(stream))
    }
}
