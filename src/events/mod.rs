//! Event-driven reporting for check suites
//!
//! The suite runner never prints. It emits structured events and the
//! observers subscribed to the [`EventBus`] decide what to do with them:
//!
//! ```text
//! SuiteRunner → EventBus → [ConsoleReporter, LoggingObserver, SummaryObserver, ...]
//! ```

pub mod bus;
pub mod observers;

pub use bus::{CheckObserver, EventBus};

use crate::core::equations::{CheckResult, EquationId};
use crate::core::suite::{SuiteHeader, Variant, Verdict};
use serde::Serialize;

/// Everything a suite reports while it runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckEvent {
    /// A suite is about to evaluate its six equations
    SuiteStarted {
        /// Representation variant under test
        variant: Variant,
        /// Parameter values shown in the report header
        header: SuiteHeader,
    },

    /// An equation is about to be evaluated
    EquationStarted {
        /// Equation label
        equation: EquationId,
        /// True for the deep nested sums, which may take a while
        slow: bool,
    },

    /// An equation was evaluated
    EquationEvaluated {
        /// Outcome with the values that decided it
        result: CheckResult,
        /// Qualifier shown next to the label, e.g. "Disjoint"
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<&'static str>,
        /// Wall-clock evaluation time
        elapsed_ms: u64,
    },

    /// All six equations were evaluated
    SuiteFinished {
        /// Representation variant under test
        variant: Variant,
        /// Conjunction of the six outcomes
        verdict: Verdict,
        /// Number of equations that hold
        passed: usize,
    },
}

impl CheckEvent {
    /// Short name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            CheckEvent::SuiteStarted { .. } => "SuiteStarted",
            CheckEvent::EquationStarted { .. } => "EquationStarted",
            CheckEvent::EquationEvaluated { .. } => "EquationEvaluated",
            CheckEvent::SuiteFinished { .. } => "SuiteFinished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = CheckEvent::SuiteFinished {
            variant: Variant::TwoStepShared,
            verdict: Verdict::Passed,
            passed: 6,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SuiteFinished");
        assert_eq!(json["variant"], "two-step-shared");
        assert_eq!(json["verdict"], "Passed");
        assert_eq!(json["passed"], 6);
    }

    #[test]
    fn test_equation_started_serializes_label() {
        let event = CheckEvent::EquationStarted {
            equation: EquationId::double_dash(3),
            slow: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["equation"], "2.3''");
        assert_eq!(json["slow"], true);
        assert_eq!(event.kind(), "EquationStarted");
    }
}
