//! Transport — the publish boundary between a VSM message and the bus (§4.1).
//!
//! Two implementations are selectable at startup. `InMemoryTransport` parses the routing key
//! prefix and feeds the `vsm::Dispatcher` directly. `BrokerTransport` models the broker-backed
//! connection lifecycle (connect/reconnect/idempotent exchange declaration) behind a pluggable
//! `BrokerConnector`, since no message-broker client crate appears anywhere in this workspace's
//! dependency tree — wiring a concrete one in is an integration decision left to the binary that
//! assembles this crate, not something to fabricate here.

mod broker;
mod in_memory;

pub use broker::{BrokerConnector, BrokerTransport, ConnectionState};
pub use in_memory::InMemoryTransport;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;

/// Publish options (§4.1 contract: `publish(exchange, routing_key, message, opts)`).
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub persistent: bool,
}

/// The publish boundary every VSM system publishes through.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Value,
        meta: HashMap<String, Value>,
        opts: PublishOptions,
    ) -> Result<(), CoreError>;
}
