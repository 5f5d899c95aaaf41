//! Per-item progress reporting from inside a stage body.

use serde::Serialize;

use crate::core::{StageOutcome, StageState};
use crate::events::{EventSink, LifecycleEvent};

/// Accept predicate of a stage.
pub type AcceptFn<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// Accumulates a stage's outcome while its body runs.
///
/// Every recorded item updates the counters first and then emits one
/// `Executing` event carrying a snapshot of the outcome so far.
pub struct StageProgress<'a, T> {
    outcome: StageOutcome<T>,
    sink: &'a dyn EventSink,
    accept: AcceptFn<'a, T>,
}

impl<'a, T: Serialize> StageProgress<'a, T> {
    /// Creates progress for a stage with zero counters.
    pub fn new(stage: impl Into<String>, sink: &'a dyn EventSink, accept: AcceptFn<'a, T>) -> Self {
        Self {
            outcome: StageOutcome::new(stage),
            sink,
            accept,
        }
    }

    /// Records one evaluated item and reports it.
    pub async fn record(&mut self, item: T, description: impl Into<String>) {
        self.outcome.processed += 1;
        if (self.accept)(&item) {
            self.outcome.accepted += 1;
        } else {
            self.outcome.rejected += 1;
        }
        self.outcome.items.push(item);

        let event = LifecycleEvent::new(StageState::Executing, description, self.snapshot());
        self.sink.emit(&event).await;
    }

    /// Adds a stage-level message.
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.outcome.messages.push(message.into());
    }

    /// The outcome accumulated so far.
    #[must_use]
    pub fn outcome(&self) -> &StageOutcome<T> {
        &self.outcome
    }

    /// A snapshot of the outcome accumulated so far.
    #[must_use]
    pub fn snapshot(&self) -> StageOutcome<serde_json::Value> {
        self.outcome.snapshot()
    }

    /// Hands out the accumulated outcome.
    #[must_use]
    pub fn into_outcome(self) -> StageOutcome<T> {
        self.outcome
    }
}

impl<T> std::fmt::Debug for StageProgress<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageProgress")
            .field("stage", &self.outcome.stage)
            .field("processed", &self.outcome.processed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;

    #[tokio::test]
    async fn test_record_updates_counters_before_emitting() {
        let sink = CollectingEventSink::new();
        let accept = |n: &u32| *n % 2 == 0;
        let mut progress = StageProgress::new("numbers", &sink, &accept);

        progress.record(2, "two").await;
        progress.record(3, "three").await;
        progress.add_message("note");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].outcome.processed, 1);
        assert_eq!(events[0].outcome.accepted, 1);
        assert_eq!(events[1].outcome.rejected, 1);
        assert_eq!(events[1].description, "three");
        assert!(events[1].outcome.messages.is_empty());

        let outcome = progress.into_outcome();
        assert_eq!(outcome.items, vec![2, 3]);
        assert_eq!(outcome.messages, vec!["note"]);
        assert!(outcome.is_balanced());
    }
}
