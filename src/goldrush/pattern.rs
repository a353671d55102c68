//! Pattern registry (§4.6, secondary): named conditions over a message's fields, each paired
//! with an action that synthesizes an algedonic signal when matched.

use serde_json::Value;

use super::plugin::{Plugin, PluginOutcome};
use crate::telemetry::TelemetryEvent;

/// A condition evaluated against a message's `measurements`/`metadata`.
pub enum Condition {
    /// Field at `path` equals `value`.
    Eq { path: String, value: Value },
    /// Field at `path`, read as a number, is greater than `value`.
    Gt { path: String, value: f64 },
}

/// What to synthesize when a pattern's condition matches.
#[derive(Debug, Clone)]
pub struct AlgedonicAction {
    pub severity: String,
    pub category: String,
    pub intensity: f64,
}

/// One named pattern: a condition plus the action to take when it matches.
pub struct PatternRule {
    pub name: String,
    pub condition: Condition,
    pub action: AlgedonicAction,
}

/// Looks up a dotted path like `"measurements.risk_score"` or `"metadata.labels.env"` against a
/// message, descending into nested JSON objects past the first segment.
fn lookup<'a>(msg: &'a TelemetryEvent, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let root = parts.next()?;
    let map = match root {
        "measurements" => &msg.measurements,
        "metadata" => &msg.metadata,
        _ => return None,
    };
    let first_key = parts.next()?;
    let mut current = map.get(first_key)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

impl Condition {
    fn matches(&self, msg: &TelemetryEvent) -> bool {
        match self {
            Condition::Eq { path, value } => lookup(msg, path) == Some(value),
            Condition::Gt { path, value } => lookup(msg, path)
                .and_then(Value::as_f64)
                .is_some_and(|v| v > *value),
        }
    }
}

/// An ordered collection of named pattern rules, itself usable as a plugin in a
/// `GoldrushPipeline` chain: the first matching rule's action is applied to the message (setting
/// `severity`/`category`/`intensity` metadata) and the chain halts.
#[derive(Default)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: PatternRule) {
        self.rules.push(rule);
    }
}

impl Plugin for PatternRegistry {
    fn name(&self) -> &str {
        "pattern_registry"
    }

    fn run(&self, msg: TelemetryEvent) -> PluginOutcome {
        for rule in &self.rules {
            if rule.condition.matches(&msg) {
                let tagged = msg
                    .with_metadata("severity", rule.action.severity.clone())
                    .with_metadata("category", rule.action.category.clone())
                    .with_metadata("pattern", rule.name.clone())
                    .with_measurement("intensity", rule.action.intensity);
                return PluginOutcome::Halt(tagged);
            }
        }
        PluginOutcome::Continue(msg)
    }
}
