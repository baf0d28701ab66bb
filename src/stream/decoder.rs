// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Event decoder: one framed record in, one decoded generate event out.
// Blank records are keep-alive/formatting artifacts and are dropped
// silently; malformed records are reported so the sink can log and skip.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use super::types::{preview, GenerateEvent, StreamError};
use crate::upstream::UpstreamError;

/// Decode one framed record.
///
/// Returns `None` for blank/whitespace-only records, `Some(Err(..))` for a
/// record that is not valid JSON, `Some(Ok(..))` otherwise. A single bad
/// record never terminates the session — the error is per-record.
pub fn decode_record(record: &[u8]) -> Option<Result<GenerateEvent, StreamError>> {
    let text = String::from_utf8_lossy(record);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<GenerateEvent>(trimmed) {
        Ok(event) => Some(Ok(event)),
        Err(e) => Some(Err(StreamError::MalformedEvent {
            reason: e.to_string(),
            preview: preview(trimmed),
        })),
    }
}

/// Map a stream of framed records into a stream of decoded events,
/// preserving record order.
pub fn events<S>(records: S) -> impl Stream<Item = Result<GenerateEvent, StreamError>> + Send
where
    S: Stream<Item = Result<Bytes, UpstreamError>> + Send + 'static,
{
    records.filter_map(|item| async move {
        match item {
            Ok(record) => decode_record(&record),
            Err(e) => Some(Err(StreamError::Upstream(e))),
        }
    })
}
