//! Long-lived message channel to the UI.
//!
//! A [`Port`] is the only way streamed output reaches the client. Each
//! streamed request posts any number of `CHUNK`/`REASONING` events followed
//! by exactly one terminal `DONE` or `ERROR`, unless the client disconnects
//! first.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;

/// A message posted to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamEvent {
    /// A content increment.
    Chunk { data: String },
    /// A reasoning increment.
    Reasoning { data: String },
    /// The stream completed.
    Done,
    /// The stream failed.
    Error { error: String },
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// The client side of the port has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("port disconnected")]
pub struct PortClosed;

/// Sending half of a UI port.
pub trait Port: Clone + Send + Sync {
    /// Post an event. Fails once the client has disconnected.
    fn post(&self, event: StreamEvent) -> Result<(), PortClosed>;

    /// Resolves once the client disconnects.
    fn closed(&self) -> impl Future<Output = ()> + Send;

    /// Whether the client has disconnected.
    fn is_closed(&self) -> bool;
}

/// In-process port backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl Port for ChannelPort {
    fn post(&self, event: StreamEvent) -> Result<(), PortClosed> {
        self.tx.send(event).map_err(|_| PortClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a [`ChannelPort`], held by the client.
#[derive(Debug)]
pub struct PortReceiver {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
}

impl PortReceiver {
    /// Receive the next event, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Receive events until a terminal one arrives or the port drains.
    pub async fn collect(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }

    /// Disconnect from the client side. Buffered events stay readable.
    pub fn disconnect(&mut self) {
        self.rx.close();
    }
}

/// Create a connected port pair.
pub fn channel() -> (ChannelPort, PortReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelPort { tx }, PortReceiver { rx })
}
