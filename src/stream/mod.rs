// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// NDJSON relay pipeline.
//
// Responsibilities:
// - Reassemble arbitrary upstream byte fragments into newline-terminated
//   records (a trailing unterminated record is discarded)
// - Decode each record as a {response, done} generate event; skip blank
//   records; report malformed records without aborting the stream
// - Relay text deltas to the downstream body in order, with backpressure
// - First done:true closes the response; upstream exhaustion closes it too
// - Client disconnect releases the upstream connection
// - Upstream failure mid-stream ends the body abruptly (headers are already
//   committed) and is logged server-side

mod decoder;
mod framer;
mod relay;
mod types;

pub use decoder::{decode_record, events};
pub use framer::{records, LineFramer};
pub use relay::{relay_body, relay_stream};
pub use types::{GenerateEvent, StreamError};
