//! S3 RateLimiter — fixed-window token budgets keyed by `(budget_name, client)` (§4.4).
//!
//! Budgets are registered up front (`register_budget`); a request against an unregistered budget
//! name is `unknown_budget`, distinct from `rate_limited` (§4.4) — the shared-LLM router treats
//! the two differently, so this module must keep them as separate error variants rather than
//! collapsing to a single "denied" outcome.
//!
//! An unregistered budget is this component's "dependency unavailable" case (§7): the limiter has
//! no configuration to enforce against. `Environment::Prod` fails closed and rejects the request;
//! `Dev`/`Test` fail open, granting the token and logging instead.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::config::Environment;

/// Errors from `request_tokens`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateLimiterError {
    /// The request would exceed `limit` within the current window.
    #[error("rate limited: budget '{budget}' for client '{client}'")]
    RateLimited { budget: String, client: String },
    /// No budget is registered under this name.
    #[error("unknown budget: '{budget}'")]
    UnknownBudget { budget: String },
}

/// A budget key: a budget name, optionally scoped to a client for tenant isolation (§4.4,
/// "Keys may be scalar or tuples").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BudgetKey {
    pub budget: String,
    pub client: Option<String>,
}

impl BudgetKey {
    /// A scalar key, e.g. `:foo` — no per-client isolation.
    pub fn scalar(budget: impl Into<String>) -> Self {
        Self {
            budget: budget.into(),
            client: None,
        }
    }

    /// A tuple key, e.g. `{:mcp_tools, "client_a"}` — isolates quota per client.
    pub fn tenant(budget: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            budget: budget.into(),
            client: Some(client.into()),
        }
    }

    fn client_label(&self) -> &str {
        self.client.as_deref().unwrap_or("*")
    }
}

/// Per-`budget_key` limit configuration: `{limit, window_ms}` (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct BudgetSpec {
    pub limit: u32,
    pub window_ms: u64,
}

struct Window {
    count: u32,
    window_start: DateTime<Utc>,
}

struct State {
    specs: HashMap<String, BudgetSpec>,
    windows: HashMap<BudgetKey, Window>,
}

/// Fixed-window token-budget limiter.
///
/// Priority is accepted by `request_tokens` and recorded for telemetry only — granting is not
/// priority-preemptive here (§4.4: "priority is enforced by S2, not here").
#[derive(Clone)]
pub struct RateLimiter {
    state: std::sync::Arc<Mutex<State>>,
    environment: Environment,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

impl RateLimiter {
    pub fn new(environment: Environment) -> Self {
        Self {
            state: std::sync::Arc::new(Mutex::new(State {
                specs: HashMap::new(),
                windows: HashMap::new(),
            })),
            environment,
        }
    }

    /// Register (or replace) the limit configuration for a budget name. Existing windows for
    /// keys under this budget are left as-is; they pick up the new spec on their next reset.
    pub fn register_budget(&self, budget: impl Into<String>, limit: u32, window_ms: u64) {
        self.state
            .lock()
            .specs
            .insert(budget.into(), BudgetSpec { limit, window_ms });
    }

    /// Request `1` token against `key`, recording `op`/`priority` for telemetry only.
    ///
    /// Fixed window: if `now - window_start >= window_ms`, the counter and window reset before
    /// the grant check runs, so a request arriving exactly at window expiry starts a fresh
    /// window rather than being judged against the stale one (§3 "count resets to 0 atomically
    /// on next request").
    pub fn request_tokens(
        &self,
        key: &BudgetKey,
        _op: &str,
        _priority: f64,
    ) -> Result<(), RateLimiterError> {
        let mut state = self.state.lock();
        let spec = match state.specs.get(&key.budget) {
            Some(spec) => *spec,
            None => {
                if self.environment.fails_closed() {
                    return Err(RateLimiterError::UnknownBudget {
                        budget: key.budget.clone(),
                    });
                }
                warn!(budget = %key.budget, environment = ?self.environment, "unknown budget, failing open");
                return Ok(());
            }
        };

        let now = Utc::now();
        let window = state.windows.entry(key.clone()).or_insert(Window {
            count: 0,
            window_start: now,
        });

        if (now - window.window_start).num_milliseconds().max(0) as u64 >= spec.window_ms {
            window.count = 0;
            window.window_start = now;
        }

        if window.count >= spec.limit {
            return Err(RateLimiterError::RateLimited {
                budget: key.budget.clone(),
                client: key.client_label().to_string(),
            });
        }

        window.count += 1;
        Ok(())
    }

    /// Current count within the active window for `key`, for tests/diagnostics. Returns `0` for
    /// a key with no requests yet, even if the budget itself is registered.
    pub fn current_count(&self, key: &BudgetKey) -> u32 {
        self.state
            .lock()
            .windows
            .get(key)
            .map(|w| w.count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_budget_is_distinct_from_rate_limited() {
        let limiter = RateLimiter::new(Environment::Prod);
        let key = BudgetKey::scalar("nope");
        assert_eq!(
            limiter.request_tokens(&key, "op", 1.0),
            Err(RateLimiterError::UnknownBudget {
                budget: "nope".to_string()
            })
        );
    }

    #[test]
    fn unknown_budget_fails_open_in_dev() {
        let limiter = RateLimiter::new(Environment::Dev);
        let key = BudgetKey::scalar("nope");
        assert!(limiter.request_tokens(&key, "op", 1.0).is_ok());
    }

    #[test]
    fn grants_until_limit_then_rate_limits() {
        let limiter = RateLimiter::new(Environment::Prod);
        limiter.register_budget("mcp_tools", 2, 60_000);
        let key = BudgetKey::scalar("mcp_tools");

        assert!(limiter.request_tokens(&key, "op", 1.0).is_ok());
        assert!(limiter.request_tokens(&key, "op", 1.0).is_ok());
        assert_eq!(
            limiter.request_tokens(&key, "op", 1.0),
            Err(RateLimiterError::RateLimited {
                budget: "mcp_tools".to_string(),
                client: "*".to_string()
            })
        );
    }

    #[tokio::test]
    async fn window_resets_after_elapsed_ms() {
        let limiter = RateLimiter::new(Environment::Prod);
        limiter.register_budget("mcp_tools", 2, 10);
        let key = BudgetKey::scalar("mcp_tools");

        assert!(limiter.request_tokens(&key, "op", 1.0).is_ok());
        assert!(limiter.request_tokens(&key, "op", 1.0).is_ok());
        assert!(limiter.request_tokens(&key, "op", 1.0).is_err());

        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        assert!(limiter.request_tokens(&key, "op", 1.0).is_ok());
    }

    #[test]
    fn tenant_keys_isolate_quota() {
        let limiter = RateLimiter::new(Environment::Prod);
        limiter.register_budget("mcp_tools", 2, 60_000);
        let a = BudgetKey::tenant("mcp_tools", "A");
        let b = BudgetKey::tenant("mcp_tools", "B");

        assert!(limiter.request_tokens(&a, "op", 1.0).is_ok());
        assert!(limiter.request_tokens(&a, "op", 1.0).is_ok());
        assert!(limiter.request_tokens(&a, "op", 1.0).is_err());

        assert!(limiter.request_tokens(&b, "op", 1.0).is_ok());
    }
}
