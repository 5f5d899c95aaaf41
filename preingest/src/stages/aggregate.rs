//! Counters and verdict of a stage.

use crate::core::{ResultValue, StageOutcome};

/// Accept/reject counts over a set of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Items counted.
    pub processed: usize,
    /// Items passing the predicate.
    pub accepted: usize,
    /// Items failing it.
    pub rejected: usize,
}

impl Tally {
    /// Counts `items` with an accept predicate.
    pub fn count<'a, T: 'a>(
        items: impl IntoIterator<Item = &'a T>,
        accept: impl Fn(&T) -> bool,
    ) -> Self {
        items.into_iter().fold(Self::default(), |mut tally, item| {
            tally.processed += 1;
            if accept(item) {
                tally.accepted += 1;
            } else {
                tally.rejected += 1;
            }
            tally
        })
    }

    /// The verdict of a stage that ran to completion.
    #[must_use]
    pub fn result_value(&self) -> ResultValue {
        ResultValue::from_rejected(self.rejected)
    }
}

/// Sets the counters and verdict of a completed stage from its items.
pub fn finalize<T>(outcome: &mut StageOutcome<T>, accept: impl Fn(&T) -> bool) -> Tally {
    let tally = Tally::count(&outcome.items, accept);
    outcome.processed = tally.processed;
    outcome.accepted = tally.accepted;
    outcome.rejected = tally.rejected;
    outcome.result_value = tally.result_value();
    tally
}

/// Marks an outcome as failed: nothing accepted, every attempted item
/// rejected, and the failure lines appended to the stage messages.
pub fn fail<T>(outcome: &mut StageOutcome<T>, lines: Vec<String>) {
    outcome.accepted = 0;
    outcome.rejected = outcome.processed;
    outcome.result_value = ResultValue::Failed;
    outcome.messages.extend(lines);
}
