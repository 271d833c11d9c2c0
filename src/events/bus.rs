//! EventBus - fan-out of check events to observers
//!
//! Evaluation is synchronous and single-threaded, so the bus is a plain
//! list of observers called in subscription order. Emitting with no
//! observers is a no-op.

use super::CheckEvent;

/// Receives every event emitted on the bus it is subscribed to
pub trait CheckObserver: Send {
    /// Handle one event
    fn on_event(&mut self, event: &CheckEvent);
}

/// Central event bus for suite reporting
///
/// # Example
///
/// ```
/// use repverify::events::{EventBus, observers::SummaryObserver};
///
/// let summary = SummaryObserver::new();
/// let handle = summary.summary_handle();
/// let bus = EventBus::new().with_observer(summary);
/// assert_eq!(bus.observer_count(), 1);
/// assert_eq!(handle.lock().unwrap().suites_run, 0);
/// ```
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn CheckObserver>>,
}

impl EventBus {
    /// Create a bus with no observers
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer, builder style
    pub fn with_observer<O: CheckObserver + 'static>(mut self, observer: O) -> Self {
        self.subscribe(observer);
        self
    }

    /// Add an observer
    pub fn subscribe<O: CheckObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Deliver an event to every observer
    pub fn emit(&mut self, event: CheckEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    /// Number of subscribed observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
