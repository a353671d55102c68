//! Shared error kinds for the coordination & message-routing substrate.
//!
//! Components with genuinely narrower failure modes keep their own enum (see
//! `coordinator::CoordinatorError`, `rate_limiter::RateLimiterError`) and convert into `CoreError`
//! at the boundary where a caller needs the full uniform kind set (e.g. the shared-LLM router
//! absorbing both rate-limiter and provider-timeout failures). Components whose failures already
//! are the uniform set (`circuit_breaker`, `shared_llm`, `vsm`, `transport`) return `CoreError`
//! directly. This mirrors how `supervisor::SupervisorError` is the single error surface for the
//! supervisor tree while individual child factories keep their own error types.

use thiserror::Error;

/// Uniform error kind surfaced at component boundaries.
///
/// Variant names follow the error kinds enumerated for the core (rate limiting, admission
/// control, circuit breaking, routing, timeouts). Boundary translation to transport-specific
/// codes (HTTP 429/503, AMQP nack, ...) is the caller's responsibility — this type only carries
/// the kind and enough context to log it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A rate-limiter budget was exhausted for the current window.
    #[error("rate limited: budget '{budget}' for client '{client}'")]
    RateLimited { budget: String, client: String },

    /// `request_tokens` was called against a budget with no registered configuration.
    #[error("unknown budget: '{budget}'")]
    UnknownBudget { budget: String },

    /// The S2 coordinator has no free slot for this lane under the current fair-share cap.
    #[error("backpressure: lane '{lane}' at capacity {cap}")]
    Backpressure { lane: String, cap: usize },

    /// A circuit breaker is open and is rejecting calls without executing them.
    #[error("circuit open: '{endpoint}'")]
    CircuitOpen { endpoint: String },

    /// The shared-LLM router's in-flight table is at `max_in_flight` and cannot admit a new,
    /// distinct (non-deduplicated) request.
    #[error("too many requests: {in_flight}/{max_in_flight} in flight")]
    TooManyRequests { in_flight: usize, max_in_flight: usize },

    /// An RPC-style call exceeded its caller-supplied timeout.
    #[error("timeout after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The broker-backed transport attempted to publish while disconnected.
    #[error("not connected to broker")]
    NotConnected,

    /// A message's routing key did not match the `s[1-5].*` dispatch pattern.
    #[error("unknown routing key: '{routing_key}'")]
    UnknownRoutingKey { routing_key: String },

    /// A routing-key or pattern-registry pattern failed to parse.
    #[error("invalid pattern: '{pattern}'")]
    InvalidPattern { pattern: String },

    /// A pattern-registry entry is missing its synthesis action.
    #[error("missing action for pattern '{pattern}'")]
    MissingAction { pattern: String },

    /// An actor/handler registry rejected registration past its hook capacity.
    #[error("max hooks reached: {max}")]
    MaxHooksReached { max: usize },

    /// A component that only mocks or stubs its dependency refused to start under
    /// `Environment::Prod` (§7 "the in-memory mock publisher must refuse to start in production
    /// configuration").
    #[error("'{component}' refuses to start in a production environment")]
    RefusesProduction { component: String },
}

impl CoreError {
    /// Returns `true` for errors that are always safe to retry after a short delay.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::RateLimited { .. }
                | CoreError::Backpressure { .. }
                | CoreError::TooManyRequests { .. }
                | CoreError::Timeout { .. }
                | CoreError::NotConnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(CoreError::RateLimited {
            budget: "b".into(),
            client: "c".into()
        }
        .is_retryable());
        assert!(!CoreError::UnknownBudget { budget: "b".into() }.is_retryable());
    }

    #[test]
    fn display_includes_context() {
        let err = CoreError::CircuitOpen {
            endpoint: "llm-provider-a".into(),
        };
        assert!(err.to_string().contains("llm-provider-a"));
    }
}
