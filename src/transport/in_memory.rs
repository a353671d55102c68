//! In-memory transport: synchronously parses the routing key and hands the message to the
//! `vsm::Dispatcher`, which itself runs the handler off a queue so this call never blocks on the
//! handler's own work (§4.1 "In-memory").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{PublishOptions, Transport};
use crate::config::Environment;
use crate::error::CoreError;
use crate::telemetry::{names, TelemetryBus, TelemetryEvent};
use crate::vsm::{Dispatcher, Message};

/// In-memory transport used for local/test deployments and single-process assemblies.
///
/// Never wraps a real broker, so it refuses to build at all under `Environment::Prod` (§7,
/// §4.1) rather than silently running as a mock in production.
#[derive(Clone)]
pub struct InMemoryTransport {
    dispatcher: Dispatcher,
    telemetry: TelemetryBus,
    /// Test-only collector: every published message is also copied here when set (§4.1
    /// "In-memory": "may also copy the message to a registered collector").
    collector: Arc<Mutex<Option<Vec<(String, Value)>>>>,
}

impl InMemoryTransport {
    pub fn new(dispatcher: Dispatcher, telemetry: TelemetryBus, environment: Environment) -> Result<Self, CoreError> {
        if environment.fails_closed() {
            return Err(CoreError::RefusesProduction {
                component: "in_memory_transport".to_string(),
            });
        }
        Ok(Self {
            dispatcher,
            telemetry,
            collector: Arc::new(Mutex::new(None)),
        })
    }

    /// Start collecting every published `(routing_key, payload)` pair for test assertions.
    pub fn enable_collector(&self) {
        *self.collector.lock() = Some(Vec::new());
    }

    /// Drain everything collected so far.
    pub fn drain_collected(&self) -> Vec<(String, Value)> {
        self.collector.lock().as_mut().map(std::mem::take).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Value,
        meta: HashMap<String, Value>,
        _opts: PublishOptions,
    ) -> Result<(), CoreError> {
        let payload_size = serde_json::to_vec(&payload).map(|v| v.len()).unwrap_or(0);

        if let Some(collected) = self.collector.lock().as_mut() {
            collected.push((routing_key.to_string(), payload.clone()));
        }

        let msg = Message::new(routing_key, payload, meta);
        self.dispatcher.dispatch(msg)?;

        // Fixed telemetry schema (§12 redesign note: the source mock publisher built this
        // metadata with a dynamic key equal to the *value* of `exchange`, not the atom
        // `:exchange` — a bug. This uses a fixed, documented shape instead.)
        self.telemetry
            .publish(
                TelemetryEvent::new(names::TRANSPORT_PUBLISH)
                    .with_metadata("exchange", exchange)
                    .with_metadata("routing_key", routing_key)
                    .with_measurement("payload_size", payload_size as i64)
                    .with_metadata("source", "in_memory_transport"),
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsm::VsmHandler;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingHandler {
        system: u8,
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VsmHandler for CountingHandler {
        fn system(&self) -> u8 {
            self.system
        }
        async fn handle_message(
            &self,
            _operation: &str,
            _payload: Value,
            _meta: HashMap<String, Value>,
            _trace_id: Uuid,
        ) -> Result<(), CoreError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn publish_routes_to_matching_system_handler() {
        let dispatcher = Dispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));
        dispatcher.register(Arc::new(CountingHandler { system: 2, count: count.clone() }));

        let transport = InMemoryTransport::new(dispatcher, TelemetryBus::new(), Environment::Dev).expect("in-memory transport builds in dev");
        transport
            .publish(
                "cybernetic.exchange",
                "s2.reserve_slot",
                Value::Null,
                HashMap::new(),
                PublishOptions::default(),
            )
            .await
            .expect("publish ok");

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn collector_captures_published_messages() {
        let dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(CountingHandler {
            system: 1,
            count: Arc::new(AtomicUsize::new(0)),
        }));
        let transport = InMemoryTransport::new(dispatcher, TelemetryBus::new(), Environment::Test).expect("in-memory transport builds in test");
        transport.enable_collector();

        transport
            .publish(
                "cybernetic.exchange",
                "s1.ingest",
                Value::from("payload"),
                HashMap::new(),
                PublishOptions::default(),
            )
            .await
            .expect("publish ok");

        let collected = transport.drain_collected();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].0, "s1.ingest");
    }

    #[test]
    fn refuses_to_build_in_production() {
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            InMemoryTransport::new(dispatcher, TelemetryBus::new(), Environment::Prod),
            Err(CoreError::RefusesProduction { .. })
        ));
    }
}
