use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::clock;
use super::store::{Message, MessageStore, StoreError};

/// Per-connection send buffer. Delivery uses `try_send`, so a client
/// that stops draining loses events instead of stalling the hub.
const CONNECTION_BUFFER: usize = 64;

/// Who gets a delivery. The reference behavior sends every message to
/// every live connection; `Narrowcast` restricts it to the two
/// participants and is opt-in only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    #[default]
    Broadcast,
    Narrowcast,
}

impl std::str::FromStr for DeliveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "broadcast" => Ok(DeliveryPolicy::Broadcast),
            "narrowcast" => Ok(DeliveryPolicy::Narrowcast),
            _ => Err(format!("unknown delivery mode: {s}")),
        }
    }
}

/// Inbound send event. Either field missing (or empty) makes the whole
/// event a no-op, so both are optional at the parse layer.
#[derive(Debug, Deserialize)]
pub struct Inbound {
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

struct Connection {
    username: String,
    tx: mpsc::Sender<String>,
}

/// The set of live connections. Process-local, rebuilt empty on restart.
/// A user may hold several connections at once; each gets its own id and
/// its own buffered sender.
#[derive(Default)]
pub struct Registry {
    connections: DashMap<u64, Connection>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn register(&self, username: &str) -> (u64, mpsc::Receiver<String>) {
        let conn_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        self.connections.insert(
            conn_id,
            Connection {
                username: username.to_owned(),
                tx,
            },
        );
        debug!(conn_id, user = username, "connection registered");
        (conn_id, rx)
    }

    pub fn deregister(&self, conn_id: u64) {
        if self.connections.remove(&conn_id).is_some() {
            debug!(conn_id, "connection deregistered");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Takes inbound send events, persists them, then fans the formatted
/// event out to live connections. Persistence always finishes before
/// any delivery is attempted, and a dead or slow connection never
/// affects the others.
pub struct Hub {
    store: MessageStore,
    registry: Registry,
    policy: DeliveryPolicy,
}

impl Hub {
    pub fn new(store: MessageStore, policy: DeliveryPolicy) -> Self {
        Self {
            store,
            registry: Registry::default(),
            policy,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the persisted message, or `None` when the event was
    /// incomplete and silently discarded.
    pub async fn handle_send(
        &self,
        sender: &str,
        Inbound { receiver, text }: Inbound,
    ) -> Result<Option<Message>, StoreError> {
        let (Some(receiver), Some(text)) = (receiver, text) else {
            debug!(user = sender, "discarding incomplete send event");
            return Ok(None);
        };
        if receiver.is_empty() || text.is_empty() {
            debug!(user = sender, "discarding incomplete send event");
            return Ok(None);
        }

        let message = self.store.append(sender, &receiver, &text, clock::now()).await?;
        self.deliver(&message);

        Ok(Some(message))
    }

    fn deliver(&self, message: &Message) {
        let event = serde_json::to_string(&message.view()).expect("message view serializes");

        for entry in self.registry.connections.iter() {
            let conn = entry.value();
            if self.policy == DeliveryPolicy::Narrowcast
                && conn.username != message.sender
                && conn.username != message.receiver
            {
                continue;
            }
            if let Err(err) = conn.tx.try_send(event.clone()) {
                warn!(conn_id = *entry.key(), user = %conn.username, "dropping delivery: {err}");
            }
        }
    }
}
