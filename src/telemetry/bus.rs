//! Global telemetry bus: a single pub/sub hub keyed by event path.
//!
//! Every emitter (coordinator, rate limiter, aggregator, goldrush, breaker, alerts) publishes
//! onto one bus instance; every subscriber (aggregator ingest, goldrush plugin chain, breaker
//! alert fan-out) attaches with an opaque handle used later to detach. Handler invocation is
//! isolated: a panicking handler is caught and logged, never propagated to the publisher or to
//! other handlers, and dispatch concurrency is capped so a publish flood cannot spawn unbounded
//! tasks (§9 "Background dispatch").

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use super::event::TelemetryEvent;

/// Opaque handle returned from `TelemetryBus::attach`, used to `detach` later.
///
/// Mirrors `ChildId`/`ActorId`'s newtype-over-counter shape elsewhere in this crate, but uses a
/// plain atomic counter since handles are purely local bookkeeping, never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerHandle(u64);

type Handler = Arc<dyn Fn(&TelemetryEvent) + Send + Sync>;

/// Maximum number of concurrent handler-dispatch tasks per publish, bounding task creation under
/// a telemetry flood.
const MAX_CONCURRENT_DISPATCH: usize = 64;

#[derive(Clone)]
pub struct TelemetryBus {
    inner: Arc<Inner>,
}

struct Inner {
    handlers: DashMap<HandlerHandle, (String, Handler)>,
    next_handle: AtomicU64,
    dispatch_permits: Semaphore,
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBus {
    /// Create a fresh, empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                handlers: DashMap::new(),
                next_handle: AtomicU64::new(0),
                dispatch_permits: Semaphore::new(MAX_CONCURRENT_DISPATCH),
            }),
        }
    }

    /// Attach a handler for every event whose `name` starts with `prefix` (pass `""` to observe
    /// everything). Returns a handle that must be passed to `detach` on shutdown so callbacks
    /// never fire into a vanished owner (§4.5 "Handler safety").
    pub fn attach<F>(&self, prefix: impl Into<String>, handler: F) -> HandlerHandle
    where
        F: Fn(&TelemetryEvent) + Send + Sync + 'static,
    {
        let handle = HandlerHandle(self.inner.next_handle.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .insert(handle, (prefix.into(), Arc::new(handler)));
        handle
    }

    /// Detach a previously attached handler. A detach of an unknown handle is a no-op.
    pub fn detach(&self, handle: HandlerHandle) {
        self.inner.handlers.remove(&handle);
    }

    /// Publish an event to every handler whose prefix matches. Each matching handler runs on its
    /// own bounded worker task; a handler panic is caught and logged, never propagated (§7
    /// "Exception isolation").
    pub async fn publish(&self, event: TelemetryEvent) {
        let matching: Vec<Handler> = self
            .inner
            .handlers
            .iter()
            .filter(|entry| event.name.starts_with(entry.value().0.as_str()))
            .map(|entry| entry.value().1.clone())
            .collect();

        for handler in matching {
            let permit = match self.inner.dispatch_permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // bus is shutting down
            };
            let event = event.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let result = AssertUnwindSafe(async { handler(&event) })
                    .catch_unwind()
                    .await;
                if result.is_err() {
                    error!(event = %event.name, "telemetry handler panicked");
                }
            });
        }
    }

    /// Number of currently attached handlers, for tests and diagnostics.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }
}

/// Log-and-drop an event that failed ingest-side validation (§7 "Ingest-side errors").
pub fn log_dropped_event(reason: &str, event: &TelemetryEvent) {
    warn!(event = %event.name, reason, "dropping malformed telemetry event");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn matching_prefix_handlers_receive_event() {
        let bus = TelemetryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();

        bus.attach("cyb.s2", move |_ev| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        bus.attach("cyb.other", |_ev| {
            panic!("should never be invoked");
        });

        bus.publish(TelemetryEvent::new("cyb.s2.reserve")).await;
        // allow spawned dispatch tasks to run
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn detach_stops_future_delivery() {
        let bus = TelemetryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let handle = bus.attach("cyb", move |_ev| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        bus.detach(handle);
        bus.publish(TelemetryEvent::new("cyb.s2.reserve")).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.handler_count(), 0);
    }

    #[tokio::test]
    async fn panicking_handler_does_not_stop_others() {
        let bus = TelemetryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();

        bus.attach("cyb", |_ev| panic!("boom"));
        bus.attach("cyb", move |_ev| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(TelemetryEvent::new("cyb.x")).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
