// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// Chunk framer: the transport does not guarantee that one network read
// equals one logical event, so raw fragments are buffered and re-split on
// newline boundaries.

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

use crate::upstream::UpstreamError;

/// Reassembles arbitrary byte fragments into newline-terminated records.
///
/// Pure buffer logic, no I/O: `push` fragments in, `next_record` complete
/// records out. The stream adapter [`records`] drives it from an upstream
/// byte stream.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one incoming fragment.
    pub fn push(&mut self, fragment: &[u8]) {
        self.buf.extend_from_slice(fragment);
    }

    /// Take the next complete record, delimiter removed. Returns `None`
    /// until a newline has been buffered.
    pub fn next_record(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut record = self.buf.split_to(pos + 1);
        record.truncate(pos);
        Some(record.freeze())
    }

    /// Bytes buffered but not yet emitted. At end-of-stream a non-empty
    /// remainder is an interrupted record and is never emitted.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Turn an upstream byte stream into a lazy stream of complete records.
///
/// Finite, tied to one upstream connection. An upstream error is yielded
/// once and ends the sequence; a trailing unterminated record is discarded.
pub fn records<S>(input: S) -> impl Stream<Item = Result<Bytes, UpstreamError>> + Send
where
    S: Stream<Item = Result<Bytes, UpstreamError>> + Send + Unpin + 'static,
{
    let state = (LineFramer::new(), input, false);
    futures_util::stream::unfold(state, |(mut framer, mut input, mut ended)| async move {
        loop {
            if let Some(record) = framer.next_record() {
                return Some((Ok(record), (framer, input, ended)));
            }
            if ended {
                if framer.pending() > 0 {
                    tracing::debug!(
                        pending_bytes = framer.pending(),
                        "discarding unterminated record at end of stream"
                    );
                }
                return None;
            }
            match input.next().await {
                Some(Ok(fragment)) => framer.push(&fragment),
                Some(Err(e)) => {
                    ended = true;
                    return Some((Err(e), (framer, input, ended)));
                }
                None => ended = true,
            }
        }
    })
}
