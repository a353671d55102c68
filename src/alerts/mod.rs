//! Circuit-Breaker Alerts — breaker-state subscription with debounced, health-classified alert
//! fan-out (§4.9).
//!
//! Subscribes to `cyb.circuit_breaker.opened`, classifies each transition by `health_score`, and
//! tracks an aggregate view across providers. Alerts are debounced per key and fanned out to
//! registered handlers with exception isolation, the same contract `telemetry::bus` gives its
//! subscribers — a panicking handler here is caught synchronously (no async boundary to cross)
//! rather than via `catch_unwind` on a future.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::error;

use crate::config::AlertConfig;
use crate::telemetry::{names, HandlerHandle, TelemetryBus, TelemetryEvent};

/// Alert severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }

    fn numeric(self) -> f64 {
        match self {
            AlertSeverity::Info => 0.0,
            AlertSeverity::Warning => 0.5,
            AlertSeverity::Critical => 1.0,
        }
    }
}

/// A single alert handed to registered handlers and published on the bus.
#[derive(Debug, Clone)]
pub struct Alert {
    pub key: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub ts: DateTime<Utc>,
}

type Handler = Arc<dyn Fn(&Alert) + Send + Sync>;

#[derive(Clone, Copy)]
struct ProviderHealth {
    open: bool,
    health_score: f64,
}

struct Inner {
    config: AlertConfig,
    telemetry: TelemetryBus,
    handlers: Mutex<Vec<Handler>>,
    last_sent: Mutex<HashMap<String, DateTime<Utc>>>,
    provider_health: Mutex<HashMap<String, ProviderHealth>>,
}

/// Breaker-state alert manager.
#[derive(Clone)]
pub struct AlertManager {
    inner: Arc<Inner>,
}

impl AlertManager {
    pub fn new(config: AlertConfig, telemetry: TelemetryBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                telemetry,
                handlers: Mutex::new(Vec::new()),
                last_sent: Mutex::new(HashMap::new()),
                provider_health: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a handler invoked for every alert that survives debouncing. Exception isolation:
    /// a handler that panics is caught and logged, never propagated to other handlers (§4.9 "fanned
    /// out ... with exception isolation").
    pub fn register_handler<F>(&self, handler: F)
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.inner.handlers.lock().push(Arc::new(handler));
    }

    /// Attach to the global bus. Returns a handle for `shutdown`-time detach.
    pub fn start(&self) -> HandlerHandle {
        let manager = self.clone();
        self.inner
            .telemetry
            .attach(names::CIRCUIT_BREAKER_OPENED, move |event| manager.handle_event(event))
    }

    fn handle_event(&self, event: &TelemetryEvent) {
        let Some(endpoint) = event.metadata_str("circuit_breaker") else {
            return;
        };
        let Some(state) = event.metadata_str("state") else {
            return;
        };
        let health_score = event.measurement_f64("health_score").unwrap_or(1.0);

        {
            let mut health = self.inner.provider_health.lock();
            health.insert(
                endpoint.to_string(),
                ProviderHealth {
                    open: state == "open",
                    health_score,
                },
            );
        }

        if state == "open" {
            let severity = if health_score < self.inner.config.critical_health_threshold {
                AlertSeverity::Critical
            } else if health_score < self.inner.config.warning_health_threshold {
                AlertSeverity::Warning
            } else {
                AlertSeverity::Info
            };
            self.maybe_emit(
                &format!("circuit_breaker:{endpoint}"),
                severity,
                format!("circuit breaker opened for {endpoint} (health_score={health_score:.2})"),
            );
        }

        self.emit_aggregate();
    }

    fn emit_aggregate(&self) {
        let (critical_count, degraded_count, any_open) = {
            let health = self.inner.provider_health.lock();
            let critical = health
                .values()
                .filter(|h| h.open && h.health_score < self.inner.config.critical_health_threshold)
                .count() as u32;
            let degraded = health
                .values()
                .filter(|h| {
                    h.open
                        && h.health_score >= self.inner.config.critical_health_threshold
                        && h.health_score < self.inner.config.warning_health_threshold
                })
                .count() as u32;
            let any_open = health.values().any(|h| h.open);
            (critical, degraded, any_open)
        };

        if critical_count >= self.inner.config.multiple_failure_threshold {
            self.maybe_emit(
                "aggregate:critical",
                AlertSeverity::Critical,
                format!("{critical_count} providers critical"),
            );
        } else if critical_count + degraded_count >= self.inner.config.multiple_failure_threshold {
            self.maybe_emit(
                "aggregate:warning",
                AlertSeverity::Warning,
                format!("{} providers degraded or critical", critical_count + degraded_count),
            );
        } else if !any_open {
            self.maybe_emit("aggregate:recovery", AlertSeverity::Info, "all providers recovered".to_string());
        }
    }

    fn maybe_emit(&self, key: &str, severity: AlertSeverity, message: String) {
        let now = Utc::now();
        {
            let mut last_sent = self.inner.last_sent.lock();
            if let Some(sent_at) = last_sent.get(key) {
                let elapsed_ms = (now - *sent_at).num_milliseconds().max(0) as u64;
                if elapsed_ms < self.inner.config.alert_cooldown_ms {
                    return;
                }
            }
            last_sent.insert(key.to_string(), now);
        }

        let alert = Alert {
            key: key.to_string(),
            severity,
            message,
            ts: now,
        };

        let handlers: Vec<Handler> = self.inner.handlers.lock().clone();
        for handler in handlers {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| handler(&alert)));
            if result.is_err() {
                error!(key = %alert.key, "alert handler panicked");
            }
        }

        let telemetry = self.inner.telemetry.clone();
        let alert_for_publish = alert.clone();
        tokio::spawn(async move {
            telemetry
                .publish(
                    TelemetryEvent::new(names::ALERTS_CIRCUIT_BREAKER)
                        .with_measurement("severity_numeric", alert_for_publish.severity.numeric())
                        .with_metadata("alert_key", alert_for_publish.key.clone())
                        .with_metadata("severity", alert_for_publish.severity.as_str())
                        .with_metadata("message", alert_for_publish.message.clone()),
                )
                .await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn breaker_event(endpoint: &str, state: &str, health_score: f64) -> TelemetryEvent {
        TelemetryEvent::new(names::CIRCUIT_BREAKER_OPENED)
            .with_metadata("circuit_breaker", endpoint)
            .with_metadata("state", state)
            .with_measurement("health_score", health_score)
    }

    #[test]
    fn low_health_score_classifies_critical() {
        let manager = AlertManager::new(AlertConfig::default(), TelemetryBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let seen_severity = Arc::new(Mutex::new(AlertSeverity::Info));
        let count2 = count.clone();
        let severity2 = seen_severity.clone();
        manager.register_handler(move |alert| {
            count2.fetch_add(1, Ordering::SeqCst);
            *severity2.lock() = alert.severity;
        });

        manager.handle_event(&breaker_event("provider-a", "open", 0.1));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen_severity.lock(), AlertSeverity::Critical);
    }

    #[test]
    fn debounce_suppresses_repeat_within_cooldown() {
        let mut config = AlertConfig::default();
        config.alert_cooldown_ms = 300_000;
        let manager = AlertManager::new(config, TelemetryBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        manager.register_handler(move |_alert| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        manager.handle_event(&breaker_event("provider-a", "open", 0.1));
        manager.handle_event(&breaker_event("provider-a", "open", 0.1));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn two_critical_providers_trigger_aggregate_alert() {
        let manager = AlertManager::new(AlertConfig::default(), TelemetryBus::new());
        let keys = Arc::new(Mutex::new(Vec::new()));
        let keys2 = keys.clone();
        manager.register_handler(move |alert| {
            keys2.lock().push(alert.key.clone());
        });

        manager.handle_event(&breaker_event("provider-a", "open", 0.05));
        manager.handle_event(&breaker_event("provider-b", "open", 0.05));

        assert!(keys.lock().iter().any(|k| k == "aggregate:critical"));
    }

    #[test]
    fn panicking_handler_does_not_block_others() {
        let manager = AlertManager::new(AlertConfig::default(), TelemetryBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();

        manager.register_handler(|_alert| panic!("boom"));
        manager.register_handler(move |_alert| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        manager.handle_event(&breaker_event("provider-a", "open", 0.1));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
