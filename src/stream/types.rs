// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Core types for the relay pipeline: decoded events and stream errors.

use serde::Deserialize;

use crate::upstream::UpstreamError;

/// One decoded generate event from the upstream NDJSON stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateEvent {
    /// Incremental text fragment. May be absent or empty (the final event
    /// usually carries no text).
    #[serde(default)]
    pub response: Option<String>,
    /// Completion flag: no further deltas will arrive after this.
    #[serde(default)]
    pub done: bool,
}

/// Errors that can occur while relaying a stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// One record failed to parse. Recovered by skipping the record; never
    /// surfaced to the caller.
    #[error("malformed event record ({reason}): {preview}")]
    MalformedEvent { reason: String, preview: String },

    /// The upstream connection failed after streaming began. Not recoverable
    /// mid-response.
    #[error("upstream stream failed: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Max characters of a malformed record echoed into logs.
const PREVIEW_CHARS: usize = 120;

/// Bounded preview of a record for log lines.
pub(super) fn preview(record: &str) -> String {
    if record.chars().count() <= PREVIEW_CHARS {
        record.to_string()
    } else {
        let head: String = record.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}
