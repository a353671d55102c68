//! Plugin trait and the built-in latency plugin (§4.6).

use crate::telemetry::TelemetryEvent;

/// One step in a `GoldrushPipeline`'s plugin chain.
pub trait Plugin: Send + Sync {
    /// Short identifier used in logs when this plugin errors.
    fn name(&self) -> &str;

    /// Process one message, returning how the chain should proceed (§4.6).
    fn run(&self, msg: TelemetryEvent) -> PluginOutcome;
}

/// Result of running one plugin against a message.
pub enum PluginOutcome {
    /// Continue the chain with the (possibly modified) message.
    Continue(TelemetryEvent),
    /// Stop the chain; this message is final.
    Halt(TelemetryEvent),
    /// Stop the chain and drop the event entirely — no algedonic signal is emitted.
    Error(String),
}

/// Built-in latency-to-algedonic plugin (§4.6): tags the message `pain` if `duration_ms` is at
/// or above `pain_threshold_ms`, `pleasure` if at or below `pleasure_threshold_ms`, otherwise
/// passes the message through unchanged.
pub struct LatencyPlugin {
    pain_threshold_ms: f64,
    pleasure_threshold_ms: f64,
}

impl LatencyPlugin {
    pub fn new(pain_threshold_ms: f64, pleasure_threshold_ms: f64) -> Self {
        Self {
            pain_threshold_ms,
            pleasure_threshold_ms,
        }
    }
}

impl Plugin for LatencyPlugin {
    fn name(&self) -> &str {
        "latency"
    }

    fn run(&self, msg: TelemetryEvent) -> PluginOutcome {
        let Some(duration) = msg.measurement_f64("duration_ms") else {
            return PluginOutcome::Continue(msg);
        };

        if duration >= self.pain_threshold_ms {
            PluginOutcome::Continue(msg.with_metadata("severity", "pain"))
        } else if duration <= self.pleasure_threshold_ms {
            PluginOutcome::Continue(msg.with_metadata("severity", "pleasure"))
        } else {
            PluginOutcome::Continue(msg)
        }
    }
}
