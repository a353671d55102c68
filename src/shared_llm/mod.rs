//! Shared-LLM Router — in-flight request dedup and waiter coalescing (§4.7).
//!
//! `chat`/`embed`/`complete` all funnel through `call`: a rate-limit check against the tenant's
//! `shared_llm` budget, an in-flight cap check, then fingerprint-based coalescing — a second
//! caller for a fingerprint already in flight joins the first caller's waiter list instead of
//! triggering another upstream call, and both observe the identical result once it completes.

mod fingerprint;

pub use fingerprint::fingerprint;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::instrument;

use crate::config::{Environment, SharedLlmConfig};
use crate::error::CoreError;
use crate::rate_limiter::{BudgetKey, RateLimiter, RateLimiterError};
use crate::telemetry::{names, TelemetryBus, TelemetryEvent};

/// The underlying LLM provider pool this router dispatches to. Implementors own retry, model
/// selection, and transport concerns; the router only sees operation + params in, result out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn call(&self, operation: &str, params: &Value) -> Result<Value, CoreError>;
}

/// Per-call options. `bypass_cache` disables caching accounting only — dedup always runs (§4.7c).
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    pub bypass_cache: bool,
    pub priority: f64,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            bypass_cache: false,
            priority: 1.0,
        }
    }
}

/// A point-in-time snapshot of router statistics (§4.7 "Stats tracked").
#[derive(Debug, Clone)]
pub struct SharedLlmStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub deduplicated: u64,
    pub errors: u64,
    pub by_source: HashMap<String, u64>,
    pub by_operation: HashMap<String, u64>,
    pub uptime: chrono::Duration,
    pub hit_rate: f64,
}

#[derive(Default)]
struct Stats {
    total_requests: u64,
    cache_hits: u64,
    cache_misses: u64,
    deduplicated: u64,
    errors: u64,
    by_source: HashMap<String, u64>,
    by_operation: HashMap<String, u64>,
}

struct Inner {
    config: SharedLlmConfig,
    rate_limiter: RateLimiter,
    telemetry: TelemetryBus,
    provider: Arc<dyn LlmProvider>,
    in_flight: DashMap<String, Vec<oneshot::Sender<Result<Value, CoreError>>>>,
    stats: Mutex<Stats>,
    started_at: DateTime<Utc>,
}

/// Dedup/coalescing front for the LLM provider pool.
#[derive(Clone)]
pub struct SharedLlmRouter {
    inner: Arc<Inner>,
}

impl SharedLlmRouter {
    pub fn new(
        config: SharedLlmConfig,
        rate_limiter: RateLimiter,
        telemetry: TelemetryBus,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        rate_limiter.register_budget("shared_llm", u32::MAX, 1);
        Self {
            inner: Arc::new(Inner {
                config,
                rate_limiter,
                telemetry,
                provider,
                in_flight: DashMap::new(),
                stats: Mutex::new(Stats::default()),
                started_at: Utc::now(),
            }),
        }
    }

    /// Register (or replace) the `shared_llm` budget for a specific tenant, overriding the
    /// effectively-unlimited default registered at construction (§4.7 step 1 runs against
    /// whatever limit is currently registered for `(shared_llm, tenant)`).
    pub fn set_tenant_budget(&self, limit: u32, window_ms: u64) {
        self.inner.rate_limiter.register_budget("shared_llm", limit, window_ms);
    }

    pub async fn chat(&self, tenant: &str, params: Value, opts: CallOptions) -> Result<Value, CoreError> {
        self.call(tenant, "chat", params, opts).await
    }

    pub async fn embed(&self, tenant: &str, params: Value, opts: CallOptions) -> Result<Value, CoreError> {
        self.call(tenant, "embed", params, opts).await
    }

    pub async fn complete(&self, tenant: &str, params: Value, opts: CallOptions) -> Result<Value, CoreError> {
        self.call(tenant, "complete", params, opts).await
    }

    #[instrument(skip(self, params), fields(tenant = %tenant, operation = %operation))]
    async fn call(
        &self,
        tenant: &str,
        operation: &str,
        params: Value,
        opts: CallOptions,
    ) -> Result<Value, CoreError> {
        let key = BudgetKey::tenant("shared_llm", tenant);
        match self.inner.rate_limiter.request_tokens(&key, operation, opts.priority) {
            Ok(()) => {}
            Err(RateLimiterError::RateLimited { budget, client }) => {
                return Err(CoreError::RateLimited { budget, client });
            }
            Err(RateLimiterError::UnknownBudget { budget }) => {
                // §4.4: the router distinguishes unknown_budget from rate_limited and allows the
                // call through rather than rejecting it, regardless of the limiter's own
                // environment policy.
                warn!(%budget, tenant, "unknown shared_llm budget, allowing call");
            }
        }

        if self.inner.in_flight.len() >= self.inner.config.max_in_flight {
            return Err(CoreError::TooManyRequests {
                in_flight: self.inner.in_flight.len(),
                max_in_flight: self.inner.config.max_in_flight,
            });
        }

        let fp = fingerprint(operation, &params);
        let (tx, rx) = oneshot::channel();

        let should_spawn = match self.inner.in_flight.entry(fp.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().push(tx);
                self.record(tenant, operation, opts.bypass_cache, true);
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(vec![tx]);
                self.record(tenant, operation, opts.bypass_cache, false);
                true
            }
        };

        self.inner
            .telemetry
            .publish(
                TelemetryEvent::new(names::SHARED_LLM_REQUEST)
                    .with_metadata("tenant", tenant)
                    .with_metadata("operation", operation)
                    .with_measurement("deduplicated", !should_spawn),
            )
            .await;

        if should_spawn {
            let provider = self.inner.provider.clone();
            let timeout_ms = self.inner.config.timeout_ms;
            let params_for_call = params.clone();
            let operation_owned = operation.to_string();
            let inner = self.inner.clone();
            let fp_for_task = fp.clone();
            tokio::spawn(async move {
                let result = match tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    provider.call(&operation_owned, &params_for_call),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(CoreError::Timeout {
                        elapsed_ms: timeout_ms,
                    }),
                };
                complete(&inner, &fp_for_task, result).await;
            });
        }

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    fn record(&self, tenant: &str, operation: &str, bypass_cache: bool, was_dedup_hit: bool) {
        let mut stats = self.inner.stats.lock();
        stats.total_requests += 1;
        *stats.by_source.entry(tenant.to_string()).or_insert(0) += 1;
        *stats.by_operation.entry(operation.to_string()).or_insert(0) += 1;

        if was_dedup_hit {
            stats.deduplicated += 1;
            if !bypass_cache {
                stats.cache_hits += 1;
            }
        } else if !bypass_cache {
            stats.cache_misses += 1;
        }
    }

    /// Snapshot current stats (§4.7 "Stats tracked").
    pub fn stats(&self) -> SharedLlmStats {
        let stats = self.inner.stats.lock();
        let denom = stats.cache_hits + stats.cache_misses;
        let hit_rate = if denom == 0 {
            0.0
        } else {
            stats.cache_hits as f64 / denom as f64
        };
        SharedLlmStats {
            total_requests: stats.total_requests,
            cache_hits: stats.cache_hits,
            cache_misses: stats.cache_misses,
            deduplicated: stats.deduplicated,
            errors: stats.errors,
            by_source: stats.by_source.clone(),
            by_operation: stats.by_operation.clone(),
            uptime: Utc::now() - self.inner.started_at,
            hit_rate,
        }
    }

    /// Number of distinct fingerprints currently in flight, for tests/diagnostics.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }
}

async fn complete(inner: &Arc<Inner>, fp: &str, result: Result<Value, CoreError>) {
    if let Some((_, waiters)) = inner.in_flight.remove(fp) {
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
    if result.is_err() {
        inner.stats.lock().errors += 1;
    }
}
