//! Circuit-Breaker — per-endpoint closed/open/half_open state machine (§4.8).
//!
//! `call` takes a fallible async closure and returns a single `Result` shape regardless of
//! whether the wrapped call ran (Open Question decision, SPEC_FULL §12: the two-shape
//! success/failure return in the source collapses to one `Result<T, CoreError>` here).
//!
//! A missing `last_failure_ts` while open is this component's "dependency unavailable" case (§7):
//! the breaker can't tell whether the timeout has elapsed. `Environment::Prod` fails closed and
//! keeps rejecting; `Dev`/`Test` fail open and admit the probe.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{instrument, warn};

use crate::config::{BreakerConfig, Environment};
use crate::error::CoreError;
use crate::telemetry::{names, TelemetryBus, TelemetryEvent};

/// Circuit-breaker state (§3 "Circuit-breaker").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

struct State {
    state: BreakerState,
    failure_count: u32,
    success_count: u32,
    last_failure_ts: Option<DateTime<Utc>>,
}

struct Inner {
    endpoint: String,
    config: BreakerConfig,
    telemetry: TelemetryBus,
    environment: Environment,
    state: Mutex<State>,
}

/// A single endpoint's circuit breaker.
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Inner>,
}

impl CircuitBreaker {
    pub fn new(
        endpoint: impl Into<String>,
        config: BreakerConfig,
        telemetry: TelemetryBus,
        environment: Environment,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                endpoint: endpoint.into(),
                config,
                telemetry,
                environment,
                state: Mutex::new(State {
                    state: BreakerState::Closed,
                    failure_count: 0,
                    success_count: 0,
                    last_failure_ts: None,
                }),
            }),
        }
    }

    /// Current state, for tests/diagnostics and for alert subscribers that poll instead of
    /// listening on the bus.
    pub fn state(&self) -> BreakerState {
        self.inner.state.lock().state
    }

    /// Run `f` through the breaker. Rejects immediately with `CircuitOpen` while open (unless the
    /// timeout has elapsed, in which case this call itself becomes the half-open probe).
    #[instrument(skip(self, f), fields(endpoint = %self.inner.endpoint))]
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        if !self.admit() {
            return Err(CoreError::CircuitOpen {
                endpoint: self.inner.endpoint.clone(),
            });
        }

        match f().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(err)
            }
        }
    }

    /// Decide whether a call should be admitted, performing the open -> half_open transition if
    /// the timeout has elapsed (§4.8 "open").
    fn admit(&self) -> bool {
        let mut state = self.inner.state.lock();
        match state.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let ambiguous_fallback = if self.inner.environment.fails_closed() {
                    0
                } else {
                    u64::MAX
                };
                let elapsed_ms = state
                    .last_failure_ts
                    .map(|since| (Utc::now() - since).num_milliseconds().max(0) as u64)
                    .unwrap_or(ambiguous_fallback);
                if elapsed_ms >= self.inner.config.timeout_ms {
                    state.state = BreakerState::HalfOpen;
                    state.success_count = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    async fn on_success(&self) {
        let transitioned_closed = {
            let mut state = self.inner.state.lock();
            match state.state {
                BreakerState::Closed => {
                    state.failure_count = 0;
                    false
                }
                BreakerState::HalfOpen => {
                    state.success_count += 1;
                    if state.success_count >= self.inner.config.half_open_attempts {
                        state.state = BreakerState::Closed;
                        state.failure_count = 0;
                        state.success_count = 0;
                        true
                    } else {
                        false
                    }
                }
                BreakerState::Open => false,
            }
        };

        if transitioned_closed {
            self.publish_transition(BreakerState::Closed, 1.0).await;
        }
    }

    async fn on_failure(&self) {
        let opened = {
            let mut state = self.inner.state.lock();
            state.last_failure_ts = Some(Utc::now());
            match state.state {
                BreakerState::Closed => {
                    state.failure_count += 1;
                    if state.failure_count >= self.inner.config.threshold {
                        state.state = BreakerState::Open;
                        Some(1.0 - (state.failure_count as f64 / self.inner.config.threshold as f64).min(1.0))
                    } else {
                        None
                    }
                }
                BreakerState::HalfOpen => {
                    state.state = BreakerState::Open;
                    state.success_count = 0;
                    Some(0.0)
                }
                BreakerState::Open => None,
            }
        };

        if let Some(health_score) = opened {
            self.publish_transition(BreakerState::Open, health_score).await;
        }
    }

    async fn publish_transition(&self, new_state: BreakerState, health_score: f64) {
        warn!(endpoint = %self.inner.endpoint, state = new_state.as_str(), health_score, "circuit breaker transition");
        self.inner
            .telemetry
            .publish(
                TelemetryEvent::new(names::CIRCUIT_BREAKER_OPENED)
                    .with_metadata("circuit_breaker", self.inner.endpoint.clone())
                    .with_metadata("state", new_state.as_str())
                    .with_measurement("health_score", health_score),
            )
            .await;
    }

    /// Force the breaker closed, clearing all counters (§4.8 "reset()").
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.state = BreakerState::Closed;
        state.failure_count = 0;
        state.success_count = 0;
        state.last_failure_ts = None;
    }
}
