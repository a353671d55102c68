//! Goldrush Pipeline — telemetry → event → ordered plugin chain → algedonic output (§4.6).
//!
//! Watches a fixed set of event names, threads each matching event through an ordered plugin
//! chain, and — if the plugin chain's final message carries a `pain`/`pleasure` severity — emits
//! `cybernetic.algedonic`. Plugin dispatch is synchronous (plugins are plain functions over the
//! message, no I/O); only the final publish needs to cross into async, so the bus-attached
//! handler stays a plain closure and spawns one task per matched event, mirroring how
//! `telemetry::bus` itself dispatches handlers off the publish path.

mod pattern;
mod plugin;

pub use pattern::{AlgedonicAction, Condition, PatternRegistry, PatternRule};
pub use plugin::{LatencyPlugin, Plugin, PluginOutcome};

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::telemetry::{names, HandlerHandle, TelemetryBus, TelemetryEvent};

#[derive(Clone)]
struct Inner {
    plugins: Vec<Arc<dyn Plugin>>,
    watched: HashSet<String>,
    telemetry: TelemetryBus,
}

/// Ordered plugin chain over a fixed set of watched telemetry events.
#[derive(Clone)]
pub struct GoldrushPipeline {
    inner: Arc<Inner>,
}

impl GoldrushPipeline {
    /// Build a pipeline watching `watched` event names (§4.6 default set:
    /// `work.finished`, `work.failed`, `agent.event`).
    pub fn new(telemetry: TelemetryBus, watched: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                plugins: Vec::new(),
                watched: watched.into_iter().map(Into::into).collect(),
                telemetry,
            }),
        }
    }

    /// Append a plugin to the end of the chain. Plugins run in the order added.
    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        Arc::make_mut(&mut self.inner).plugins.push(plugin);
        self
    }

    /// Attach to the global bus and begin watching. Returns a handle for `shutdown`/`detach`.
    pub fn start(&self) -> HandlerHandle {
        let pipeline = self.clone();
        self.inner.telemetry.attach("", move |event| {
            if !pipeline.inner.watched.contains(event.name.as_str()) {
                return;
            }
            if let Some(algedonic) = pipeline.run_chain(event.clone()) {
                let bus = pipeline.inner.telemetry.clone();
                tokio::spawn(async move { bus.publish(algedonic).await });
            }
        })
    }

    /// Run one event through the plugin chain, returning the algedonic event to publish, if any
    /// (§4.6: "If final msg' carries a severity ∈ {pain, pleasure}, emit algedonic").
    pub fn run_chain(&self, mut msg: TelemetryEvent) -> Option<TelemetryEvent> {
        for plugin in &self.inner.plugins {
            match plugin.run(msg) {
                PluginOutcome::Continue(next) => msg = next,
                PluginOutcome::Halt(next) => {
                    msg = next;
                    break;
                }
                PluginOutcome::Error(reason) => {
                    warn!(plugin = plugin.name(), reason, "goldrush plugin errored, dropping event");
                    return None;
                }
            }
        }

        let severity = msg.metadata_str("severity")?.to_string();
        if severity != "pain" && severity != "pleasure" {
            return None;
        }

        let mut algedonic = TelemetryEvent::new(names::ALGEDONIC).with_measurement("severity", severity.clone());
        for (k, v) in msg.metadata.iter() {
            algedonic = algedonic.with_metadata(k.clone(), v.clone());
        }
        for (k, v) in msg.measurements.iter() {
            algedonic = algedonic.with_measurement(k.clone(), v.clone());
        }
        Some(algedonic)
    }
}
