//! Event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, warn, Level};

use super::LifecycleEvent;
use crate::core::StageState;

/// Trait for sinks that receive lifecycle events.
///
/// Delivery to subscribers is the sink's concern; the stage runner only
/// produces events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: &LifecycleEvent);

    /// Tries to emit an event without blocking.
    ///
    /// This method should never fail. Errors are logged but suppressed.
    fn try_emit(&self, event: &LifecycleEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: &LifecycleEvent) {}

    fn try_emit(&self, _event: &LifecycleEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &LifecycleEvent) {
        let outcome = &event.outcome;
        if event.stage_state == StageState::Failed {
            warn!(
                stage = %outcome.stage,
                state = %event.stage_state,
                processed = outcome.processed,
                messages = ?outcome.messages,
                "{}", event.description
            );
            return;
        }
        if self.level == Level::DEBUG {
            debug!(
                stage = %outcome.stage,
                state = %event.stage_state,
                processed = outcome.processed,
                accepted = outcome.accepted,
                rejected = outcome.rejected,
                "{}", event.description
            );
        } else {
            info!(
                stage = %outcome.stage,
                state = %event.stage_state,
                processed = outcome.processed,
                accepted = outcome.accepted,
                rejected = outcome.rejected,
                "{}", event.description
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &LifecycleEvent) {
        self.log_event(event);
    }

    fn try_emit(&self, event: &LifecycleEvent) {
        self.log_event(event);
    }
}

/// A collecting event sink for testing and for callers that replay events.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<LifecycleEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.read().clone()
    }

    /// Returns the collected states in emission order.
    #[must_use]
    pub fn states(&self) -> Vec<StageState> {
        self.events.read().iter().map(|e| e.stage_state).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events in a given state.
    #[must_use]
    pub fn events_in(&self, state: StageState) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.stage_state == state)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: &LifecycleEvent) {
        self.events.write().push(event.clone());
    }

    fn try_emit(&self, event: &LifecycleEvent) {
        self.events.write().push(event.clone());
    }
}
