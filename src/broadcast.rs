//! Live event fan-out for Server-Sent-Events clients
//!
//! Every connected client owns an unbounded channel. The hub keeps the
//! sending halves in a `DashMap` keyed by client id; the receiving half is
//! handed out as an [`EventStream`] that removes its own entry when dropped.

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use uuid::Uuid;

use crate::error::Result;

/// Name of the acknowledgement event queued on connect
pub const CONNECTED_EVENT: &str = "connected";

/// Opaque client identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One named event with its serialized JSON payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEvent {
    pub name: String,
    pub data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectedAck {
    message: &'static str,
    client_id: ClientId,
}

type Sink = mpsc::UnboundedSender<BroadcastEvent>;

/// Registry of connected clients
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    clients: Arc<DashMap<ClientId, Sink>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client and queue its `connected` acknowledgement
    pub fn connect(&self) -> Result<(ClientId, EventStream)> {
        let id = ClientId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let ack = serde_json::to_string(&ConnectedAck {
            message: "Connected to review server",
            client_id: id,
        })?;
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(BroadcastEvent {
            name: CONNECTED_EVENT.to_string(),
            data: ack,
        });

        self.clients.insert(id, tx);
        tracing::info!(client = %id, clients = self.clients.len(), "client connected");

        Ok((
            id,
            EventStream {
                id,
                hub: self.clone(),
                rx,
            },
        ))
    }

    /// Remove a client. Returns whether it was still registered.
    pub fn disconnect(&self, id: ClientId) -> bool {
        let removed = self.clients.remove(&id).is_some();
        if removed {
            tracing::info!(client = %id, clients = self.clients.len(), "client disconnected");
        }
        removed
    }

    /// Send `name` with `payload` to every client. Returns the number of
    /// clients that received it.
    pub fn broadcast<T: Serialize + ?Sized>(&self, name: &str, payload: &T) -> Result<usize> {
        let data = serde_json::to_string(payload)?;
        let event = BroadcastEvent {
            name: name.to_string(),
            data,
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for entry in self.clients.iter() {
            if entry.value().send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                failed.push(*entry.key());
            }
        }

        // Removal happens after iteration; DashMap shards stay locked while iterating.
        for id in failed {
            tracing::warn!(client = %id, event = name, "evicting client after failed send");
            self.disconnect(id);
        }

        tracing::debug!(event = name, delivered, "broadcast");
        Ok(delivered)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_connected(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }
}

/// Receiving half of one client. Dropping it disconnects the client.
#[derive(Debug)]
pub struct EventStream {
    id: ClientId,
    hub: BroadcastHub,
    rx: mpsc::UnboundedReceiver<BroadcastEvent>,
}

impl EventStream {
    pub fn id(&self) -> ClientId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<BroadcastEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting
    pub fn try_recv(&mut self) -> Option<BroadcastEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for EventStream {
    type Item = BroadcastEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}
