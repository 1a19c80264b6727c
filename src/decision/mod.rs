//! Decision engine: ordered rules over the snapshot and device state.
//!
//! ```text
//!  SensorSnapshot ─┐
//!                  ├─▶ RULES[0] ─▶ RULES[1] ─▶ … ─▶ RULES[6] (Maintain)
//!  DeviceState ────┘        │ Some(action): stop
//!                           ▼
//!                        Decision { rule, action }
//! ```
//!
//! The engine is stateless between calls.  Rate limiting lives in
//! [`EvaluationGate`], which the caller consults before evaluating.

pub mod rules;
pub mod source;

use core::fmt;

use crate::config::RuleThresholds;
use crate::model::{Action, Capabilities, DeviceState, SensorSnapshot};
use rules::{RULES, RuleContext, RuleId};

pub use source::DecisionSource;

/// The winning rule and the action it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub rule: RuleId,
    pub action: Action,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} -> {}", self.rule, self.action)
    }
}

pub struct DecisionEngine {
    thresholds: RuleThresholds,
    caps: Capabilities,
}

impl DecisionEngine {
    /// `caps` are the active protocol's capabilities; rule outputs are
    /// expressed in legal values only.
    pub fn new(thresholds: RuleThresholds, caps: Capabilities) -> Self {
        Self { thresholds, caps }
    }

    pub fn evaluate(&self, snapshot: &SensorSnapshot, device: &DeviceState, now_ms: u64) -> Action {
        self.decide(snapshot, device, now_ms).action
    }

    /// First matching rule in priority order.
    pub fn decide(&self, snapshot: &SensorSnapshot, device: &DeviceState, now_ms: u64) -> Decision {
        let ctx = RuleContext {
            snapshot,
            device,
            now_ms,
            thresholds: &self.thresholds,
            caps: &self.caps,
        };
        RULES
            .iter()
            .find_map(|rule| (rule.check)(&ctx).map(|action| Decision { rule: rule.id, action }))
            .unwrap_or(Decision {
                rule: RuleId::Fallback,
                action: Action::Maintain,
            })
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }
}

// ---------------------------------------------------------------------------
// Evaluation gate
// ---------------------------------------------------------------------------

/// Minimum-interval limiter for automatic evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationGate {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl EvaluationGate {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    /// True when no evaluation has run yet or the interval has elapsed.
    pub fn ready(&self, now_ms: u64) -> bool {
        self.last_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= self.interval_ms)
    }

    /// Record an evaluation (or a manual override) at `now_ms`; the next
    /// evaluation waits a full interval from here.
    pub fn restart(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    /// Consume the gate if it is open.
    pub fn try_pass(&mut self, now_ms: u64) -> bool {
        let open = self.ready(now_ms);
        if open {
            self.restart(now_ms);
        }
        open
    }
}
