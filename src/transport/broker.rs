//! Broker-backed transport: connection lifecycle and idempotent exchange declaration over a
//! pluggable `BrokerConnector` (§4.1 "Broker-backed").
//!
//! No AMQP (or other broker) client crate is part of this workspace's dependency tree, so the
//! actual wire protocol is left behind a trait — a binary assembling this crate supplies a
//! `BrokerConnector` once it picks a concrete client. What lives here is the reconnect/idempotent
//! declaration state machine itself, which is this module's real contribution (§6 "Wire protocol
//! (broker)" describes the target shape this connects to).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};

use super::{PublishOptions, Transport};
use crate::config::{Environment, TransportConfig};
use crate::error::CoreError;

/// Bound on connect attempts under `Environment::Prod` before `connect()` gives up and returns
/// `NotConnected` instead of retrying forever (§7 fail-closed).
const PROD_MAX_CONNECT_ATTEMPTS: u32 = 10;

/// Connection lifecycle state for a `BrokerTransport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// The actual wire operations a concrete broker client must provide. `BrokerTransport` only
/// drives this trait's lifecycle; it never assumes a specific protocol.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Establish a connection and declare `exchange` (idempotently — safe to call again after a
    /// reconnect without erroring if it already exists).
    async fn connect(&self, exchange: &str, exchange_type: &str) -> Result<(), CoreError>;

    /// Publish one message body on an already-established connection.
    async fn publish_connected(&self, routing_key: &str, body: Vec<u8>) -> Result<(), CoreError>;
}

struct Inner {
    config: TransportConfig,
    connector: Arc<dyn BrokerConnector>,
    environment: Environment,
    state: Mutex<ConnectionState>,
}

/// Transport backed by a durable topic exchange via a pluggable `BrokerConnector`.
///
/// `Environment::Prod` bounds `connect()` to `PROD_MAX_CONNECT_ATTEMPTS` attempts and surfaces a
/// `NotConnected` failure instead of retrying forever (§7); `Dev`/`Test` retry indefinitely, as
/// the source's boot sequence always does.
#[derive(Clone)]
pub struct BrokerTransport {
    inner: Arc<Inner>,
}

impl BrokerTransport {
    pub fn new(config: TransportConfig, connector: Arc<dyn BrokerConnector>, environment: Environment) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                environment,
                state: Mutex::new(ConnectionState::Disconnected),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Connect asynchronously at boot, retrying with `reconnect_delay` between attempts until
    /// connected (§4.1). Exchange declaration is idempotent on the connector's side.
    ///
    /// Under `Environment::Prod`, gives up after `PROD_MAX_CONNECT_ATTEMPTS` and returns
    /// `Err(CoreError::NotConnected)` rather than retrying forever (§7).
    pub async fn connect(&self) -> Result<(), CoreError> {
        *self.inner.state.lock() = ConnectionState::Connecting;
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self
                .inner
                .connector
                .connect(&self.inner.config.exchange, &self.inner.config.exchange_type)
                .await
            {
                Ok(()) => {
                    *self.inner.state.lock() = ConnectionState::Connected;
                    info!(exchange = %self.inner.config.exchange, "broker transport connected");
                    return Ok(());
                }
                Err(err) => {
                    *self.inner.state.lock() = ConnectionState::Disconnected;
                    if self.inner.environment.fails_closed() && attempts >= PROD_MAX_CONNECT_ATTEMPTS {
                        warn!(%err, attempts, "broker connect failed, giving up (production)");
                        return Err(CoreError::NotConnected);
                    }
                    warn!(%err, attempts, "broker connect failed, retrying");
                    tokio::time::sleep(self.inner.config.reconnect_delay).await;
                }
            }
        }
    }

    /// Called by the owning supervisor when the underlying connection drops. Schedules a
    /// reconnect after `reconnect_delay` (§4.1: "on disconnect, reconnect after 5_000 ms").
    pub fn on_disconnected(&self) {
        *self.inner.state.lock() = ConnectionState::Disconnected;
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.inner.config.reconnect_delay).await;
            if let Err(err) = this.connect().await {
                warn!(%err, "broker reconnect gave up");
            }
        });
    }
}

#[async_trait]
impl Transport for BrokerTransport {
    async fn publish(
        &self,
        _exchange: &str,
        routing_key: &str,
        payload: Value,
        meta: HashMap<String, Value>,
        _opts: PublishOptions,
    ) -> Result<(), CoreError> {
        if self.state() != ConnectionState::Connected {
            return Err(CoreError::NotConnected);
        }

        let body = serde_json::json!({ "payload": payload, "meta": meta });
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        self.inner.connector.publish_connected(routing_key, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct FlakyConnector {
        attempts: Arc<AtomicUsize>,
        fail_first: usize,
    }

    #[async_trait]
    impl BrokerConnector for FlakyConnector {
        async fn connect(&self, _exchange: &str, _exchange_type: &str) -> Result<(), CoreError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(CoreError::NotConnected)
            } else {
                Ok(())
            }
        }

        async fn publish_connected(&self, _routing_key: &str, _body: Vec<u8>) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn config(reconnect_delay_ms: u64) -> TransportConfig {
        TransportConfig {
            reconnect_delay: StdDuration::from_millis(reconnect_delay_ms),
            ..TransportConfig::default()
        }
    }

    #[tokio::test]
    async fn publish_before_connect_is_not_connected() {
        let transport = BrokerTransport::new(
            config(5),
            Arc::new(FlakyConnector { attempts: Arc::new(AtomicUsize::new(0)), fail_first: 0 }),
            Environment::Dev,
        );
        let result = transport
            .publish("x", "vsm.s1.ops", Value::Null, HashMap::new(), PublishOptions::default())
            .await;
        assert!(matches!(result, Err(CoreError::NotConnected)));
    }

    #[tokio::test]
    async fn connect_retries_until_success() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let transport = BrokerTransport::new(
            config(5),
            Arc::new(FlakyConnector { attempts: attempts.clone(), fail_first: 2 }),
            Environment::Dev,
        );
        assert!(transport.connect().await.is_ok());
        assert_eq!(transport.state(), ConnectionState::Connected);
        assert!(attempts.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn connected_publish_succeeds() {
        let transport = BrokerTransport::new(
            config(5),
            Arc::new(FlakyConnector { attempts: Arc::new(AtomicUsize::new(0)), fail_first: 0 }),
            Environment::Dev,
        );
        assert!(transport.connect().await.is_ok());
        let result = transport
            .publish("x", "vsm.s1.ops", Value::Null, HashMap::new(), PublishOptions::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn prod_gives_up_after_bounded_attempts() {
        let transport = BrokerTransport::new(
            config(1),
            Arc::new(FlakyConnector { attempts: Arc::new(AtomicUsize::new(0)), fail_first: usize::MAX }),
            Environment::Prod,
        );
        assert!(matches!(transport.connect().await, Err(CoreError::NotConnected)));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }
}
