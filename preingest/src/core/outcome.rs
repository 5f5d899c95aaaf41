//! Stage-level counters, verdict and item payload.

use serde::{Deserialize, Serialize};

use super::ResultValue;

/// The result of one stage run.
///
/// Created with zero counters when the stage starts, mutated only by the
/// running stage, and handed out as an owned value once the terminal event
/// has been emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome<T> {
    /// Name of the stage that produced this outcome.
    pub stage: String,
    /// Items attempted so far.
    pub processed: usize,
    /// Items that passed the stage's accept predicate.
    pub accepted: usize,
    /// Items that did not.
    pub rejected: usize,
    /// The verdict.
    pub result_value: ResultValue,
    /// Stage-level messages.
    #[serde(default)]
    pub messages: Vec<String>,
    /// Per-item results in processing order.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> StageOutcome<T> {
    /// Creates an empty outcome for a stage.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            processed: 0,
            accepted: 0,
            rejected: 0,
            result_value: ResultValue::Success,
            messages: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Returns true if the counters are consistent.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.accepted + self.rejected == self.processed
    }

    /// Returns true if the verdict is `Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result_value == ResultValue::Success
    }

    /// Returns true if the stage failed unexpectedly.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.result_value == ResultValue::Failed
    }
}

impl<T: Serialize> StageOutcome<T> {
    /// Takes an immutable JSON snapshot of the outcome as it stands.
    ///
    /// Items that fail to serialize are recorded as `null`.
    #[must_use]
    pub fn snapshot(&self) -> StageOutcome<serde_json::Value> {
        StageOutcome {
            stage: self.stage.clone(),
            processed: self.processed,
            accepted: self.accepted,
            rejected: self.rejected,
            result_value: self.result_value,
            messages: self.messages.clone(),
            items: self
                .items
                .iter()
                .map(|item| serde_json::to_value(item).unwrap_or(serde_json::Value::Null))
                .collect(),
        }
    }
}
