//! S2 Coordinator — fair-share, aging-aware slot allocator (§4.3).
//!
//! Provides admission control and backpressure across named lanes. A lane with a higher
//! configured priority is granted a concurrency cap at least as large as a lower-priority lane's
//! at steady state (coordinator fairness, §8); a lane stuck in backpressure has its effective
//! priority boosted over time until it is guaranteed a slot (starvation bound, §8).
//!
//! An unregistered lane is this component's "dependency unavailable" case (§7): there's no
//! configured priority to compute a fair share from. `Environment::Prod` fails closed and rejects
//! the reservation; `Dev`/`Test` fail open, defaulting the lane to priority `1.0` as before.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{CoordinatorConfig, Environment};
use crate::telemetry::{names, TelemetryBus, TelemetryEvent};

/// Errors surfaced by the coordinator. `reserve_slot` never fails outright — it returns
/// `Backpressure` as an `Err` so callers can match on it without an `Ok(Granted::No)` wrapper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// No slot is currently available for this lane under its fair-share cap.
    #[error("backpressure: lane '{lane}' at cap {cap}")]
    Backpressure { lane: String, cap: usize },
    /// `lane` has no registered priority and the coordinator is running `Environment::Prod`,
    /// which fails closed on an unregistered lane rather than defaulting its priority (§7).
    #[error("unregistered lane: '{lane}'")]
    UnregisteredLane { lane: String },
}

#[derive(Debug, Clone, Default)]
struct LaneState {
    current_slots: usize,
    wait_since: Option<DateTime<Utc>>,
}

struct State {
    lanes: HashMap<String, LaneState>,
    priorities: HashMap<String, f64>,
}

/// Fair-share slot allocator for a fixed set of named lanes.
///
/// Singly owned: construct one `Coordinator` per process and share cheap clones (it wraps
/// `Arc<Mutex<..>>`, following the same owned-state-behind-`Arc` shape as
/// `monitoring::InMemoryMonitor`). `reserve_slot`/`set_priority` calls against the same
/// coordinator are serialized by the internal lock, giving per-owner arrival-order semantics
/// (§5) without a separate mailbox-actor loop.
#[derive(Clone)]
pub struct Coordinator {
    state: Arc<Mutex<State>>,
    config: CoordinatorConfig,
    telemetry: TelemetryBus,
    environment: Environment,
}

impl Coordinator {
    /// Build a coordinator with the given configuration, publishing telemetry onto `telemetry`.
    pub fn new(config: CoordinatorConfig, telemetry: TelemetryBus, environment: Environment) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                lanes: HashMap::new(),
                priorities: HashMap::new(),
            })),
            config,
            telemetry,
            environment,
        }
    }

    /// Set (or change) the priority weight for a lane. Non-negative; unset lanes default to
    /// `1.0`. Asynchronous per §5 (no reply expected).
    pub fn set_priority(&self, lane: &str, weight: f64) {
        let weight = weight.max(0.0);
        let mut state = self.state.lock();
        state.priorities.insert(lane.to_string(), weight);
        state.lanes.entry(lane.to_string()).or_default();
    }

    /// Attempt to reserve a slot for `lane`. Synchronous request/reply (§5).
    ///
    /// Implements the fair-share algorithm verbatim from §4.3:
    /// 1. `prio = priorities[lane] ?? 1.0`, `total = Σ priorities (min 1.0 each)`.
    /// 2. `waited = now − wait_since[lane]` (0 if absent).
    /// 3. `aging_boost_eff = aging_boost · min(waited / aging_ms, aging_cap)`.
    /// 4. `effective_prio = max(prio + aging_boost_eff, 0)`.
    /// 5. `share = effective_prio / (total + aging_boost · |priorities|)`.
    /// 6. `cap = max(1, round(share · max_slots))` — at least one slot per known lane.
    /// 7. Grant iff `current[lane] < cap`.
    #[instrument(skip(self), fields(lane = %lane))]
    pub async fn reserve_slot(&self, lane: &str) -> Result<(), CoordinatorError> {
        let now = Utc::now();
        let (granted, current, cap) = {
            let mut state = self.state.lock();
            if !state.priorities.contains_key(lane) && self.environment.fails_closed() {
                return Err(CoordinatorError::UnregisteredLane {
                    lane: lane.to_string(),
                });
            }
            let total: f64 = state.priorities.values().map(|p| p.max(1.0)).sum::<f64>().max(1.0);
            let lane_count = state.priorities.len().max(1) as f64;
            let prio = *state.priorities.get(lane).unwrap_or(&1.0);

            let lane_state = state.lanes.entry(lane.to_string()).or_default();
            let waited_ms = lane_state
                .wait_since
                .map(|since| (now - since).num_milliseconds().max(0) as f64)
                .unwrap_or(0.0);

            let aging_ratio = if self.config.aging_ms == 0 {
                0.0
            } else {
                (waited_ms / self.config.aging_ms as f64).min(self.config.aging_cap)
            };
            let aging_boost_eff = self.config.aging_boost * aging_ratio;
            let effective_prio = (prio + aging_boost_eff).max(0.0);
            let share = effective_prio / (total + self.config.aging_boost * lane_count);
            let cap = ((share * self.config.max_slots as f64).round() as i64).max(1) as usize;

            if lane_state.current_slots < cap {
                lane_state.current_slots += 1;
                lane_state.wait_since = Some(now);
                (true, lane_state.current_slots, cap)
            } else {
                if lane_state.wait_since.is_none() {
                    lane_state.wait_since = Some(now);
                }
                (false, lane_state.current_slots, cap)
            }
        };

        debug!(granted, current, cap, "s2.reserve");
        let elapsed_ms = (Utc::now() - now).num_milliseconds().max(0);
        self.telemetry
            .publish(
                TelemetryEvent::new(names::S2_RESERVE)
                    .with_measurement("duration", elapsed_ms)
                    .with_measurement("granted", granted)
                    .with_measurement("current", current as i64)
                    .with_measurement("max_slots", self.config.max_slots as i64)
                    .with_metadata("lane", lane),
            )
            .await;
        self.telemetry
            .publish(
                TelemetryEvent::new(names::S2_PRESSURE)
                    .with_measurement("current", current as i64)
                    .with_measurement("max_slots", self.config.max_slots as i64)
                    .with_metadata("lane", lane),
            )
            .await;

        if granted {
            Ok(())
        } else {
            Err(CoordinatorError::Backpressure {
                lane: lane.to_string(),
                cap,
            })
        }
    }

    /// Release a previously reserved slot for `lane`, flooring at zero. Asynchronous (§5),
    /// fire-and-forget — callers don't need a reply to keep going.
    pub fn release_slot(&self, lane: &str) {
        let mut state = self.state.lock();
        if let Some(lane_state) = state.lanes.get_mut(lane) {
            lane_state.current_slots = lane_state.current_slots.saturating_sub(1);
        }
    }

    /// Current slot count for a lane, for tests/diagnostics.
    pub fn current_slots(&self, lane: &str) -> usize {
        self.state
            .lock()
            .lanes
            .get(lane)
            .map(|s| s.current_slots)
            .unwrap_or(0)
    }
}
