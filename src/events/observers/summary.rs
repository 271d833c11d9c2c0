//! Summary Observer
//!
//! Tallies suites and equations across a run, e.g. for the closing
//! line of `repverify all`:
//! - Counters: suites run/passed, equations evaluated/passed
//! - Timing: total evaluation time and the slowest equation

use crate::core::equations::EquationId;
use crate::events::{CheckEvent, CheckObserver};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Tallies collected from check events
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteSummary {
    /// Suites that reached a verdict
    pub suites_run: u64,
    /// Suites whose verdict is `Passed`
    pub suites_passed: u64,
    /// Equations evaluated
    pub equations_evaluated: u64,
    /// Equations that hold
    pub equations_passed: u64,
    /// Labels of the equations that do not hold, in evaluation order
    pub failed_equations: Vec<EquationId>,
    /// Sum of the evaluation times
    pub total_elapsed_ms: u64,
    /// Slowest equation and its evaluation time
    pub slowest: Option<(EquationId, u64)>,
}

impl SuiteSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evaluated equation
    pub fn record_equation(&mut self, equation: EquationId, passed: bool, elapsed_ms: u64) {
        self.equations_evaluated += 1;
        if passed {
            self.equations_passed += 1;
        } else {
            self.failed_equations.push(equation);
        }
        self.total_elapsed_ms += elapsed_ms;
        if self.slowest.map_or(true, |(_, ms)| elapsed_ms > ms) {
            self.slowest = Some((equation, elapsed_ms));
        }
    }

    /// Record a finished suite
    pub fn record_suite(&mut self, passed: bool) {
        self.suites_run += 1;
        if passed {
            self.suites_passed += 1;
        }
    }

    /// True when every suite seen so far passed
    pub fn all_passed(&self) -> bool {
        self.suites_passed == self.suites_run
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut output = format!(
            "Suites passed: {}/{}\nEquations holding: {}/{}\n",
            self.suites_passed, self.suites_run, self.equations_passed, self.equations_evaluated
        );
        if !self.failed_equations.is_empty() {
            let labels: Vec<String> = self.failed_equations.iter().map(|e| e.to_string()).collect();
            output.push_str(&format!("Not holding: {}\n", labels.join(", ")));
        }
        if let Some((equation, ms)) = self.slowest {
            output.push_str(&format!(
                "Evaluation time: {} ms (slowest {} at {} ms)\n",
                self.total_elapsed_ms, equation, ms
            ));
        }
        output
    }
}

/// Observer that feeds a shared [`SuiteSummary`]
pub struct SummaryObserver {
    summary: Arc<Mutex<SuiteSummary>>,
}

impl SummaryObserver {
    /// Create an observer with an empty summary
    pub fn new() -> Self {
        Self {
            summary: Arc::new(Mutex::new(SuiteSummary::new())),
        }
    }

    /// Handle for reading the summary after the observer moved into a bus
    pub fn summary_handle(&self) -> Arc<Mutex<SuiteSummary>> {
        Arc::clone(&self.summary)
    }

    /// Snapshot of the current tallies
    pub fn snapshot(&self) -> SuiteSummary {
        match self.summary.lock() {
            Ok(summary) => summary.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn process_event(&self, event: &CheckEvent) {
        let mut summary = match self.summary.lock() {
            Ok(summary) => summary,
            Err(poisoned) => poisoned.into_inner(),
        };
        match event {
            CheckEvent::EquationEvaluated {
                result, elapsed_ms, ..
            } => summary.record_equation(result.equation, result.passed, *elapsed_ms),
            CheckEvent::SuiteFinished { verdict, .. } => summary.record_suite(verdict.is_passed()),
            CheckEvent::SuiteStarted { .. } | CheckEvent::EquationStarted { .. } => {}
        }
    }
}

impl Default for SummaryObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckObserver for SummaryObserver {
    fn on_event(&mut self, event: &CheckEvent) {
        self.process_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::suite::{Parameters, SuiteRunner, Variant};
    use crate::events::EventBus;

    #[test]
    fn test_record_equation_tracks_slowest() {
        let mut summary = SuiteSummary::new();
        summary.record_equation(EquationId::plain(1), true, 4);
        summary.record_equation(EquationId::plain(2), false, 9);
        summary.record_equation(EquationId::plain(3), true, 9);

        assert_eq!(summary.equations_evaluated, 3);
        assert_eq!(summary.equations_passed, 2);
        assert_eq!(summary.failed_equations, vec![EquationId::plain(2)]);
        assert_eq!(summary.total_elapsed_ms, 22);
        assert_eq!(summary.slowest, Some((EquationId::plain(2), 9)));
    }

    #[test]
    fn test_report_lists_failures() {
        let mut summary = SuiteSummary::new();
        summary.record_equation(EquationId::dash(1), false, 1);
        summary.record_suite(false);
        let report = summary.report();
        assert!(report.contains("Suites passed: 0/1"));
        assert!(report.contains("Not holding: 2.1'"));
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_observer_counts_whole_suite() {
        let observer = SummaryObserver::new();
        let handle = observer.summary_handle();
        let mut runner = SuiteRunner::new(EventBus::new().with_observer(observer));
        let report = runner
            .run(Variant::TwoStepDisjoint, &Parameters::new(10_000, 0.001, 3, 50))
            .unwrap();

        let summary = handle.lock().unwrap().clone();
        assert_eq!(summary.suites_run, 1);
        assert_eq!(summary.equations_evaluated, 6);
        let holding = report.results.iter().filter(|r| r.passed).count() as u64;
        assert_eq!(summary.equations_passed, holding);
        assert_eq!(summary.all_passed(), report.verdict.is_passed());
    }
}
