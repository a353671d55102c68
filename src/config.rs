//! Explicit, construction-time configuration for the whole substrate.
//!
//! Every tunable enumerated by the core (coordinator aging, aggregator window, breaker
//! thresholds, alert debounce, shared-LLM limits, transport connection) lives on one of the
//! structs below. Nothing here is mutated after construction — components receive their config
//! struct (or a clone of it) at construction time, the way `system::SystemConfig` is threaded
//! into `ActorSystem::new`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deployment environment, used by every protective component to select its fail-safe policy
/// (§7): production fails closed on an unavailable dependency, dev/test fail open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Environment {
    /// Local development: protective components fail open.
    #[default]
    Dev,
    /// Automated tests: same fail-open policy as `Dev`.
    Test,
    /// Production: protective components fail closed.
    Prod,
}

impl Environment {
    /// Returns `true` when a dependency outage should reject rather than allow the request.
    pub fn fails_closed(self) -> bool {
        matches!(self, Environment::Prod)
    }
}

/// S2 coordinator tuning (§4.3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Total concurrent slots shared across all lanes.
    pub max_slots: usize,
    /// Time scale over which aging boost saturates.
    pub aging_ms: u64,
    /// Maximum priority points contributed by aging.
    pub aging_boost: f64,
    /// Upper bound on `waited / aging_ms` before the boost saturates.
    pub aging_cap: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_slots: 8,
            aging_ms: 2_000,
            aging_boost: 0.5,
            aging_cap: 3.0,
        }
    }
}

/// Central aggregator tuning (§4.5, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Rolling window retained for facts and totals.
    pub window_ms: u64,
    /// Bucket granularity used to bound prune cost.
    pub bucket_ms: u64,
    /// Interval between prune + summarize passes.
    pub emit_every_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            bucket_ms: 1_000,
            emit_every_ms: 5_000,
        }
    }
}

/// Circuit-breaker tuning (§4.8, §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures (closed) before tripping to open.
    pub threshold: u32,
    /// Time an open breaker waits before allowing a half-open probe.
    pub timeout_ms: u64,
    /// Consecutive half-open successes required to fully close.
    pub half_open_attempts: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            timeout_ms: 60_000,
            half_open_attempts: 3,
        }
    }
}

/// Circuit-breaker alert tuning (§4.9, §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Minimum spacing between two alerts sharing the same key.
    pub alert_cooldown_ms: u64,
    /// Health score below which an `opened` event is classified critical.
    pub critical_health_threshold: f64,
    /// Health score below which an `opened` event is classified warning.
    pub warning_health_threshold: f64,
    /// Number of simultaneously unhealthy providers that escalates an aggregate alert.
    pub multiple_failure_threshold: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_cooldown_ms: 300_000,
            critical_health_threshold: 0.2,
            warning_health_threshold: 0.5,
            multiple_failure_threshold: 2,
        }
    }
}

/// Shared-LLM router tuning (§4.7, §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SharedLlmConfig {
    /// Upper bound on wall-clock time for an upstream call.
    pub timeout_ms: u64,
    /// Maximum number of distinct in-flight fingerprints.
    pub max_in_flight: usize,
    /// Whether the `bypass_cache` option is honored (dedup is never disabled by it, §4.7c).
    pub cache_enabled: bool,
}

impl Default for SharedLlmConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_in_flight: 100,
            cache_enabled: true,
        }
    }
}

/// A single queue binding declared at transport startup (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueBinding {
    /// VSM system number this queue feeds (1..=5).
    pub system: u8,
    /// Durable queue name, e.g. `vsm.system1.ops`.
    pub queue_name: String,
}

/// Transport configuration (§4.1, §6). `url`/`exchange` only matter for the broker-backed
/// implementation; the in-memory transport ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Broker connection URL (e.g. `amqp://localhost:5672`).
    pub url: String,
    /// Durable topic exchange name.
    pub exchange: String,
    /// Exchange type, always `topic` for this substrate.
    pub exchange_type: String,
    /// Per-system queue bindings.
    pub queues: Vec<QueueBinding>,
    /// Delay before a reconnect attempt after disconnection.
    pub reconnect_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: "amqp://localhost:5672/%2f".to_string(),
            exchange: "cybernetic.exchange".to_string(),
            exchange_type: "topic".to_string(),
            queues: (1..=5)
                .map(|n| QueueBinding {
                    system: n,
                    queue_name: format!("vsm.system{n}"),
                })
                .collect(),
            reconnect_delay: Duration::from_millis(5_000),
        }
    }
}

/// Aggregate configuration for the whole substrate, built once at process startup and passed
/// by reference/clone into each component's constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    pub environment: Environment,
    pub coordinator: CoordinatorConfig,
    pub aggregator: AggregatorConfig,
    pub breaker: BreakerConfig,
    pub alerts: AlertConfig,
    pub shared_llm: SharedLlmConfig,
    pub transport: TransportConfig,
}

impl CoreConfig {
    /// Start building a config for the given environment; all component sub-configs start at
    /// their documented defaults.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prod_fails_closed_dev_fails_open() {
        assert!(Environment::Prod.fails_closed());
        assert!(!Environment::Dev.fails_closed());
        assert!(!Environment::Test.fails_closed());
    }

    #[test]
    fn defaults_match_spec() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.coordinator.max_slots, 8);
        assert_eq!(cfg.aggregator.window_ms, 60_000);
        assert_eq!(cfg.breaker.threshold, 5);
        assert_eq!(cfg.alerts.alert_cooldown_ms, 300_000);
        assert_eq!(cfg.shared_llm.max_in_flight, 100);
        assert_eq!(cfg.transport.queues.len(), 5);
    }

    #[test]
    fn for_environment_keeps_defaults() {
        let cfg = CoreConfig::for_environment(Environment::Prod);
        assert_eq!(cfg.environment, Environment::Prod);
        assert_eq!(cfg.coordinator.max_slots, 8);
    }
}
