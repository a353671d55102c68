//! Global telemetry fabric: the event bus every component publishes onto and every observer
//! (aggregator, goldrush pipeline, circuit-breaker alerts) attaches to.
//!
//! Canonical namespace decision (SPEC_FULL §12): component-internal events use the `cyb.*`
//! prefix (`cyb.s2.reserve`, `cyb.circuit_breaker.opened`); the three cross-cutting names fixed
//! verbatim by the external contract (§6) keep the `cybernetic.*` prefix.

mod bus;
mod event;

pub use bus::{log_dropped_event, HandlerHandle, TelemetryBus};
pub use event::TelemetryEvent;

/// Canonical event names (§6 "Telemetry event names").
pub mod names {
    pub const S2_RESERVE: &str = "cyb.s2.reserve";
    pub const S2_PRESSURE: &str = "cyb.s2.pressure";
    pub const AGGREGATOR_FACTS: &str = "cybernetic.aggregator.facts";
    pub const ALGEDONIC: &str = "cybernetic.algedonic";
    pub const CIRCUIT_BREAKER_OPENED: &str = "cyb.circuit_breaker.opened";
    pub const ALERTS_CIRCUIT_BREAKER: &str = "cybernetic.alerts.circuit_breaker";
    pub const SHARED_LLM_REQUEST: &str = "cyb.shared_llm.request";
    pub const TRANSPORT_PUBLISH: &str = "cyb.transport.publish";
}
