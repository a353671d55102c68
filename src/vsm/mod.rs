//! VSM message model and per-system handler dispatch (§3 "Message", §4.2).
//!
//! `Message` carries the `"sN.operation"` routing key every other module keys off of.
//! `Dispatcher` routes a message to exactly one registered `VsmHandler` and runs it off a
//! per-routing-key queue, so a caller's publishes to the same key are delivered in order (§4.1
//! "Ordering") without ever blocking the caller on the handler's own work — a requirement for
//! avoiding cycles like S2 -> S4 -> S2 deadlocking through a shared dispatcher (§4.2 step 3).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::error::CoreError;

/// One message in flight on the bus: an opaque payload plus a `"sN.operation"` routing key,
/// optional metadata, and a trace id (§3 "Message").
#[derive(Debug, Clone)]
pub struct Message {
    pub routing_key: String,
    pub payload: Value,
    pub meta: HashMap<String, Value>,
    pub trace_id: Uuid,
}

impl Message {
    /// Build a message, extracting `trace_id` from `meta["trace_id"]` if present and valid,
    /// otherwise generating a fresh one (§4.2 step 1).
    pub fn new(routing_key: impl Into<String>, payload: Value, meta: HashMap<String, Value>) -> Self {
        let trace_id = meta
            .get("trace_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Self {
            routing_key: routing_key.into(),
            payload,
            meta,
            trace_id,
        }
    }

    /// The `N` in `"sN.operation"`, if the routing key matches that shape.
    pub fn system(&self) -> Option<u8> {
        parse_system(&self.routing_key)
    }

    /// The routing key's second segment — the operation name (§4.2 step 2).
    pub fn operation(&self) -> Option<&str> {
        self.routing_key.splitn(2, '.').nth(1)
    }
}

fn parse_system(routing_key: &str) -> Option<u8> {
    let prefix = routing_key.split('.').next()?;
    let digits = prefix.strip_prefix('s')?;
    let n: u8 = digits.parse().ok()?;
    (1..=5).contains(&n).then_some(n)
}

/// A VSM subsystem's message handler. Implementations enrich/dispatch `payload` and are free to
/// publish onward through whatever `Transport` they hold; the dispatcher never inspects the
/// return value beyond logging an error (§4.2: handler failures are the handler's own concern to
/// surface, not the dispatcher's).
#[async_trait]
pub trait VsmHandler: Send + Sync {
    /// Which system number (1..=5) this handler answers for.
    fn system(&self) -> u8;

    /// Handle one message already routed to this system.
    async fn handle_message(
        &self,
        operation: &str,
        payload: Value,
        meta: HashMap<String, Value>,
        trace_id: Uuid,
    ) -> Result<(), CoreError>;
}

struct DispatcherInner {
    handlers: DashMap<u8, Arc<dyn VsmHandler>>,
    queues: DashMap<String, mpsc::UnboundedSender<Message>>,
}

/// Routes messages to registered per-system handlers, preserving per-routing-key order.
///
/// Invariant (§3): routing keys matching `s[1-5].*` dispatch to exactly one handler; anything
/// else (or a system number with no registered handler) is `UnknownRoutingKey`.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                handlers: DashMap::new(),
                queues: DashMap::new(),
            }),
        }
    }

    /// Register a handler for its declared system number, replacing any previous registration.
    pub fn register(&self, handler: Arc<dyn VsmHandler>) {
        self.inner.handlers.insert(handler.system(), handler);
    }

    /// Enqueue `msg` for asynchronous, in-order delivery to its system's handler. Returns once
    /// the message is queued, not once it has run.
    pub fn dispatch(&self, msg: Message) -> Result<(), CoreError> {
        let system = msg.system().ok_or_else(|| CoreError::UnknownRoutingKey {
            routing_key: msg.routing_key.clone(),
        })?;
        let handler = self
            .inner
            .handlers
            .get(&system)
            .map(|entry| entry.clone())
            .ok_or_else(|| CoreError::UnknownRoutingKey {
                routing_key: msg.routing_key.clone(),
            })?;

        let sender = match self.inner.queues.get(&msg.routing_key) {
            Some(existing) => existing.clone(),
            None => {
                let (tx, rx) = mpsc::unbounded_channel::<Message>();
                self.inner.queues.insert(msg.routing_key.clone(), tx.clone());
                spawn_worker(handler, rx);
                tx
            }
        };

        sender.send(msg).map_err(|_| CoreError::NotConnected)
    }
}

fn spawn_worker(handler: Arc<dyn VsmHandler>, mut rx: mpsc::UnboundedReceiver<Message>) {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let operation = msg.operation().unwrap_or_default().to_string();
            let trace_id = msg.trace_id;
            if let Err(err) = handler
                .handle_message(&operation, msg.payload, msg.meta, trace_id)
                .await
            {
                warn!(%trace_id, %operation, %err, "vsm handler returned error");
            }
        }
    });
}
