// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Process-wide startup configuration.
//
// Built once in main from CLI/env values, validated, then passed explicitly
// (as Arc<Config>) to the auth gate and the upstream client. Nothing reads
// ambient global state after startup.

use std::time::Duration;

use crate::models::{self, ModelName};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can occur while building the startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    EmptyApiKey,

    #[error("invalid upstream URL \"{url}\": {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error(
        "unknown model \"{0}\". known models: \
         llama3, llama3.2-vision, mistral, mistral-vision, \
         qwen2.5-coder, qwen2.5-coder-vision"
    )]
    UnknownModel(String),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Immutable relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret compared against the `x-api-key` header.
    pub api_key: String,
    /// Base URL of the Ollama backend, e.g. `http://127.0.0.1:11434`.
    pub upstream_url: String,
    /// Timeout applied to buffered generate calls. Streaming calls only get
    /// a connect timeout so long generations are not cut off.
    pub request_timeout: Duration,
    /// Model used by the generic `/api/ai` and `/api/ai/stream` routes.
    pub generic_model: ModelName,
}

impl Config {
    /// Validate raw CLI/env values and build a `Config`.
    pub fn new(
        api_key: String,
        upstream_url: String,
        request_timeout_secs: u64,
        generic_model: &str,
    ) -> Result<Self, ConfigError> {
        if api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }

        let parsed = reqwest::Url::parse(&upstream_url).map_err(|e| {
            ConfigError::InvalidUpstreamUrl {
                url: upstream_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidUpstreamUrl {
                url: upstream_url,
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let generic_model = models::resolve(generic_model)
            .ok_or_else(|| ConfigError::UnknownModel(generic_model.to_string()))?;

        Ok(Self {
            api_key,
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(request_timeout_secs),
            generic_model,
        })
    }

    /// Full URL of the backend's generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.upstream_url)
    }
}
