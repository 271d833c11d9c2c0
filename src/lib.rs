//! repverify - Analytic consistency checks for hashed representations
//!
//! A hashed representation stores each item by setting bits in a shared
//! population of `n` slots; a candidate is recognised once at least `k`
//! of its slots are set. Whether such a scheme behaves as intended under
//! a given load is a question about binomial tails. This crate evaluates
//! the corresponding inequalities for four representation variants:
//!
//! - **Two-step, disjoint** (equations 2.1 … 2.6)
//! - **Two-step, shared** (2.1' … 2.6')
//! - **One-step, shared** (2.1'' … 2.6'')
//! - **One-step, partially shared** (2.1'' … 2.6'' with the disjoint 2.3'' sum)
//!
//! A variant is consistent for a parameter set when all six of its
//! equations hold.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use repverify::core::{Parameters, SuiteRunner, Variant};
//! use repverify::events::{observers::ConsoleReporter, EventBus};
//!
//! let bus = EventBus::new().with_observer(ConsoleReporter::stdout());
//! let mut runner = SuiteRunner::new(bus);
//! let report = runner
//!     .run(Variant::TwoStepShared, &Parameters::new(10_000, 0.001, 3, 50))
//!     .unwrap();
//!
//! println!("Verdict: {}", report.verdict);
//! ```

pub mod config;
pub mod core;
pub mod events;

// Re-export commonly used items at crate root
pub use config::{CheckConfig, ConfigError, ConfigOverrides};
pub use core::{
    CheckError, CheckResult, EquationId, Parameters, SuiteReport, SuiteRunner, Variant, Verdict,
};
pub use events::observers::{ConsoleReporter, LoggingObserver, SummaryObserver};
pub use events::{CheckEvent, EventBus};
