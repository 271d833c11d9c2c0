//! Event Observers
//!
//! Observers subscribe to the EventBus and process events for different purposes:
//! - `console`: the plain-text report
//! - `logging`: structured logging via tracing
//! - `summary`: tallies across suites

pub mod console;
pub mod logging;
pub mod summary;

pub use console::ConsoleReporter;
pub use logging::LoggingObserver;
pub use summary::{SuiteSummary, SummaryObserver};
