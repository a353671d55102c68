//! Central Aggregator — bounded-window fact store with rolling totals (§4.5).
//!
//! Ingests every telemetry event via a global bus attach, keeps an ordered `events` table and
//! `bucket_counts`/`totals` tables, and periodically prunes the window and emits
//! `cybernetic.aggregator.facts`. The aggregator is the single writer for its three tables (§3
//! "Shared resources") — `ingest` takes the same lock the periodic prune/summarize pass uses, so
//! there's never a window where a read sees a bucket removed but its total not yet decremented.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::AggregatorConfig;
use crate::telemetry::{log_dropped_event, names, HandlerHandle, TelemetryBus, TelemetryEvent};

type TotalKey = (String, String, String);
type BucketKey = (i64, String, String, String);

struct StoredEvent {
    source: String,
    severity: String,
    labels: String,
}

struct State {
    events: BTreeMap<(i64, u64), StoredEvent>,
    bucket_counts: HashMap<BucketKey, i64>,
    totals: HashMap<TotalKey, i64>,
}

struct Inner {
    config: AggregatorConfig,
    telemetry: TelemetryBus,
    state: Mutex<State>,
    next_ref: AtomicU64,
    ingest_enabled: AtomicBool,
}

/// A single summarized fact as emitted in `aggregator.facts` (§4.5, step 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub source: String,
    pub severity: String,
    pub labels: String,
    pub count: i64,
}

/// Bounded-window telemetry aggregator.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl Aggregator {
    /// Build an aggregator bound to `telemetry`. Call `start` to attach ingestion and begin the
    /// periodic prune/summarize loop.
    pub fn new(config: AggregatorConfig, telemetry: TelemetryBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                telemetry,
                state: Mutex::new(State {
                    events: BTreeMap::new(),
                    bucket_counts: HashMap::new(),
                    totals: HashMap::new(),
                }),
                next_ref: AtomicU64::new(0),
                ingest_enabled: AtomicBool::new(true),
            }),
        }
    }

    /// Attach to the global bus and spawn the prune/summarize loop. Returns a handle that
    /// callers must pass to `shutdown` so the bus handler is detached before the aggregator's
    /// tables go away (§4.5 "Handler safety").
    pub fn start(&self) -> AggregatorHandle {
        let ingest_target = self.clone();
        let bus_handle = self
            .inner
            .telemetry
            .attach("", move |event| ingest_target.ingest(event));

        let loop_target = self.clone();
        let emit_every_ms = self.inner.config.emit_every_ms;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(emit_every_ms));
            loop {
                interval.tick().await;
                loop_target.prune_and_summarize(Utc::now()).await;
            }
        });

        AggregatorHandle { bus_handle, task }
    }

    /// Ingest one telemetry event into the tables. Tolerates being called after `shutdown` (logs
    /// and drops) so a lingering in-flight callback can't panic the bus dispatch task (§4.5
    /// "Insertions must tolerate a missing table").
    fn ingest(&self, event: &TelemetryEvent) {
        if !self.inner.ingest_enabled.load(Ordering::Acquire) {
            log_dropped_event("aggregator shut down", event);
            return;
        }

        let source = event
            .metadata_str("source")
            .unwrap_or(event.name.as_str())
            .to_string();
        let severity = event.metadata_str("severity").unwrap_or("info").to_string();
        let labels = event.metadata_str("labels").unwrap_or("").to_string();

        let ts_ms = event.ts.timestamp_millis();
        let bucket = ts_ms / self.inner.config.bucket_ms as i64;
        let r = self.inner.next_ref.fetch_add(1, Ordering::Relaxed);

        let total_key: TotalKey = (source.clone(), severity.clone(), labels.clone());
        let bucket_key: BucketKey = (bucket, source.clone(), severity.clone(), labels.clone());

        let mut state = self.inner.state.lock();
        state.events.insert(
            (ts_ms, r),
            StoredEvent {
                source,
                severity,
                labels,
            },
        );
        *state.bucket_counts.entry(bucket_key).or_insert(0) += 1;
        *state.totals.entry(total_key).or_insert(0) += 1;
    }

    /// Run one prune + summarize pass at `now`, returning the facts emitted (also published on
    /// the bus). Exposed directly so tests don't need to wait on the interval loop.
    #[instrument(skip(self))]
    pub async fn prune_and_summarize(&self, now: DateTime<Utc>) -> Vec<Fact> {
        let window_ms = self.inner.config.window_ms as i64;
        let bucket_ms = self.inner.config.bucket_ms as i64;
        let cutoff_ts = now.timestamp_millis() - window_ms;
        let cutoff_bucket = cutoff_ts / bucket_ms;

        let facts = {
            let mut state = self.inner.state.lock();

            // Ordered range delete: everything strictly before the cutoff timestamp.
            let keep = state.events.split_off(&(cutoff_ts, 0));
            state.events = keep;

            let stale: Vec<BucketKey> = state
                .bucket_counts
                .keys()
                .filter(|(bucket, ..)| *bucket < cutoff_bucket)
                .cloned()
                .collect();

            for key in stale {
                if let Some(count) = state.bucket_counts.remove(&key) {
                    let (_, source, severity, labels) = key;
                    let total_key = (source, severity, labels);
                    if let Some(total) = state.totals.get_mut(&total_key) {
                        *total = (*total - count).max(0);
                        if *total == 0 {
                            state.totals.remove(&total_key);
                        }
                    }
                }
            }

            state
                .totals
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|((source, severity, labels), count)| Fact {
                    source: source.clone(),
                    severity: severity.clone(),
                    labels: labels.clone(),
                    count: *count,
                })
                .collect::<Vec<_>>()
        };

        self.inner
            .telemetry
            .publish(
                TelemetryEvent::new(names::AGGREGATOR_FACTS)
                    .with_measurement(
                        "facts",
                        json!(facts
                            .iter()
                            .map(|f| json!({
                                "source": f.source,
                                "severity": f.severity,
                                "labels": f.labels,
                                "count": f.count,
                            }))
                            .collect::<Vec<_>>()),
                    )
                    .with_metadata("window", self.inner.config.window_ms.to_string()),
            )
            .await;

        facts
    }

    /// Current total for one `(source, severity, labels)` key, for tests/diagnostics.
    pub fn total(&self, source: &str, severity: &str, labels: &str) -> i64 {
        self.inner
            .state
            .lock()
            .totals
            .get(&(source.to_string(), severity.to_string(), labels.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of retained events, for tests/diagnostics.
    pub fn event_count(&self) -> usize {
        self.inner.state.lock().events.len()
    }
}

/// Handle returned by `Aggregator::start`; pass to `shutdown` to detach and stop cleanly.
pub struct AggregatorHandle {
    bus_handle: HandlerHandle,
    task: JoinHandle<()>,
}

impl AggregatorHandle {
    /// Detach the bus handler first, then stop the periodic loop (§4.5 "Handler safety").
    pub fn shutdown(self, aggregator: &Aggregator) {
        aggregator.inner.telemetry.detach(self.bus_handle);
        aggregator.inner.ingest_enabled.store(false, Ordering::Release);
        self.task.abort();
    }
}
