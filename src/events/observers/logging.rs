//! Logging Observer
//!
//! Provides structured logging for suite events using the `tracing` crate.
//! Events are logged at appropriate levels:
//! - INFO: SuiteStarted, SuiteFinished
//! - WARN: an equation that does not hold, a failed verdict
//! - DEBUG: EquationStarted, EquationEvaluated

use crate::events::{CheckEvent, CheckObserver};
use tracing::{debug, info, warn};

/// Observer that logs check events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl LoggingObserver {
    /// Create a new logging observer
    pub fn new() -> Self {
        Self
    }

    /// Log a single event at the appropriate level
    pub fn log_event(event: &CheckEvent) {
        match event {
            CheckEvent::SuiteStarted { variant, header } => {
                info!(
                    variant = %variant,
                    n = header.n,
                    d = header.d,
                    r = header.r,
                    "Suite started"
                );
            }

            CheckEvent::EquationStarted { equation, slow } => {
                debug!(equation = %equation, slow = slow, "Equation started");
            }

            CheckEvent::EquationEvaluated {
                result, elapsed_ms, ..
            } => {
                if result.passed {
                    debug!(
                        equation = %result.equation,
                        expected = result.expected,
                        observed = result.observed,
                        elapsed_ms = elapsed_ms,
                        "Equation holds"
                    );
                } else {
                    warn!(
                        equation = %result.equation,
                        expected = result.expected,
                        observed = result.observed,
                        policy = ?result.policy,
                        "Equation does not hold"
                    );
                }
            }

            CheckEvent::SuiteFinished {
                variant,
                verdict,
                passed,
            } => {
                if verdict.is_passed() {
                    info!(variant = %variant, passed = passed, "Suite passed");
                } else {
                    warn!(variant = %variant, passed = passed, "Suite failed");
                }
            }
        }
    }
}

impl CheckObserver for LoggingObserver {
    fn on_event(&mut self, event: &CheckEvent) {
        Self::log_event(event);
    }
}
