//! The telemetry event shape shared by every emitter (coordinator, aggregator, goldrush,
//! breaker, alerts).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single telemetry event published on the global bus.
///
/// Mirrors the `{event, measurements, metadata, ts, node}` shape the goldrush pipeline
/// threads through its plugin chain (§4.6) and is also what the aggregator and alerting
/// subsystems ingest (§4.5, §4.9). `name` is the dotted event path, e.g. `"cyb.s2.reserve"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Dotted event path, stable and observable per §6.
    pub name: String,
    /// Numeric measurements (duration, granted, current, severity_numeric, ...).
    pub measurements: HashMap<String, Value>,
    /// Structured metadata (lane, source, labels, alert_key, ...).
    pub metadata: HashMap<String, Value>,
    /// Event timestamp.
    pub ts: DateTime<Utc>,
    /// Originating node/process identifier, defaults to a stable local tag.
    pub node: String,
}

impl TelemetryEvent {
    /// Build a bare event with no measurements or metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            measurements: HashMap::new(),
            metadata: HashMap::new(),
            ts: Utc::now(),
            node: "local".to_string(),
        }
    }

    /// Builder: attach a measurement.
    pub fn with_measurement(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.measurements.insert(key.into(), value.into());
        self
    }

    /// Builder: attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata field as a string, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Look up a measurement as f64, if present (numeric measurements are stored as JSON
    /// numbers regardless of their original Rust type).
    pub fn measurement_f64(&self, key: &str) -> Option<f64> {
        self.measurements.get(key).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trips_fields() {
        let ev = TelemetryEvent::new("cyb.s2.reserve")
            .with_measurement("duration", 12.5)
            .with_metadata("lane", "hi");

        assert_eq!(ev.name, "cyb.s2.reserve");
        assert_eq!(ev.measurement_f64("duration"), Some(12.5));
        assert_eq!(ev.metadata_str("lane"), Some("hi"));
    }
}
