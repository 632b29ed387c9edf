//! Stream multiplexer.
//!
//! Bridges one streamed completion to a [`Port`]: zero or more
//! `CHUNK`/`REASONING` events in arrival order, then exactly one `DONE` or
//! `ERROR`. If the client disconnects, the stream is dropped at once and
//! nothing else is posted.

use futures_util::{StreamExt, stream};
use provider::DeltaStream;
use qcore::{Completion, CompletionBuilder, Delta, Error, Port, Result, StreamEvent};
use std::future::Future;

/// Drive `setup` and the stream it opens, forwarding deltas to `port`.
///
/// `setup` covers everything before the first byte (configuration lookup,
/// request, retries); its failure ends the request with `ERROR` like any
/// other. Returns the accumulated completion.
pub async fn forward<P, F>(port: &P, setup: F) -> Result<Completion>
where
    P: Port,
    F: Future<Output = Result<DeltaStream>>,
{
    let outcome = tokio::select! {
        biased;
        _ = port.closed() => Err(disconnected()),
        outcome = relay(port, setup) => outcome,
    };

    let terminal = match &outcome {
        Ok(_) => StreamEvent::Done,
        Err(Error::Cancelled(_)) => {
            tracing::debug!("port disconnected, stream abandoned");
            return outcome;
        }
        Err(e) => StreamEvent::Error {
            error: e.user_message(),
        },
    };
    if port.post(terminal).is_err() {
        tracing::debug!("port closed before the terminal event");
    }
    outcome
}

/// Read the stream to its end. The stream is dropped when this returns,
/// before the terminal event is posted.
async fn relay<P: Port>(port: &P, setup: impl Future<Output = Result<DeltaStream>>) -> Result<Completion> {
    let mut stream = setup.await?;
    let mut builder = CompletionBuilder::new();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        if !delta.reasoning.is_empty() {
            port.post(StreamEvent::Reasoning {
                data: delta.reasoning.clone(),
            })
            .map_err(|_| disconnected())?;
        }
        if !delta.content.is_empty() {
            port.post(StreamEvent::Chunk {
                data: delta.content.clone(),
            })
            .map_err(|_| disconnected())?;
        }
        builder.accept(&delta);
    }
    Ok(builder.build())
}

/// A one-delta stream carrying a completion fetched whole.
pub fn whole(completion: Completion) -> DeltaStream {
    let delta = Delta {
        content: completion.content,
        reasoning: completion.reasoning.unwrap_or_default(),
    };
    Box::pin(stream::iter([Ok(delta)]))
}

fn disconnected() -> Error {
    Error::Cancelled("port disconnected".into())
}
