// Relay sink: drives the decoded event stream and forwards text deltas to
// the downstream HTTP body.
//
// One spawned task owns the upstream read loop and performs all downstream
// sends, so event order is preserved end to end. The bounded channel is the
// backpressure seam: a slow client stalls the task, which stalls the
// upstream reads.

use axum::body::Body;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::types::{GenerateEvent, StreamError};

/// Channel capacity between the relay task and the downstream body.
const RELAY_CHANNEL_CAPACITY: usize = 64;

/// Spawn the relay task and return the downstream end as a stream.
///
/// Dropping the returned stream (client disconnected) makes the task's next
/// send fail, which stops upstream consumption and releases the upstream
/// connection.
pub fn relay_stream<S>(events: S) -> ReceiverStream<Result<Bytes, StreamError>>
where
    S: Stream<Item = Result<GenerateEvent, StreamError>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
    tokio::spawn(run(events, tx));
    ReceiverStream::new(rx)
}

/// Relay the decoded events into an HTTP response body.
///
/// An `Err` item aborts the body mid-flight — the only termination signal
/// still available once headers have been sent.
pub fn relay_body<S>(events: S) -> Body
where
    S: Stream<Item = Result<GenerateEvent, StreamError>> + Send + 'static,
{
    Body::from_stream(relay_stream(events))
}

async fn run<S>(events: S, tx: mpsc::Sender<Result<Bytes, StreamError>>)
where
    S: Stream<Item = Result<GenerateEvent, StreamError>> + Send + 'static,
{
    let mut events = Box::pin(events);

    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                if let Some(delta) = event.response.as_deref() {
                    if !delta.is_empty()
                        && tx
                            .send(Ok(Bytes::copy_from_slice(delta.as_bytes())))
                            .await
                            .is_err()
                    {
                        tracing::debug!("client disconnected, releasing upstream connection");
                        return;
                    }
                }
                if event.done {
                    // First completion is authoritative; anything still
                    // queued upstream is never pulled.
                    return;
                }
            }
            Err(e @ StreamError::MalformedEvent { .. }) => {
                tracing::warn!(error = %e, "skipping malformed upstream event");
            }
            Err(e @ StreamError::Upstream(_)) => {
                tracing::warn!(error = %e, "upstream failed mid-stream, aborting response body");
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
    // Upstream exhausted without done:true — close the body normally.
}
