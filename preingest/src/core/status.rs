//! Stage state, verdict and confirmation enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a running stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageState {
    /// Emitted once, before any work.
    Started,
    /// Emitted once per processed item.
    Executing,
    /// Terminal: the stage body ran to completion.
    Completed,
    /// Terminal: an error escaped the stage body.
    Failed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Started"),
            Self::Executing => write!(f, "Executing"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

impl StageState {
    /// Returns true if the state ends a stage run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Final verdict of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResultValue {
    /// No item was rejected.
    #[default]
    Success,
    /// Validation completed but rejected at least one item.
    Error,
    /// An unexpected error stopped the stage.
    Failed,
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Error => write!(f, "Error"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

impl ResultValue {
    /// Derives the verdict of a completed stage from its rejection count.
    #[must_use]
    pub fn from_rejected(rejected: usize) -> Self {
        if rejected > 0 {
            Self::Error
        } else {
            Self::Success
        }
    }
}

/// Outcome of a check that does not apply to every record.
///
/// `Unknown` means "not applicable" and is never the same as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    /// The check did not apply to the record.
    #[default]
    Unknown,
    /// The check applied and passed.
    Confirmed,
    /// The check applied and failed.
    Rejected,
}

impl Confirmation {
    /// Maps a pass/fail result to a confirmation.
    #[must_use]
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Confirmed
        } else {
            Self::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_state_terminal() {
        assert!(StageState::Completed.is_terminal());
        assert!(StageState::Failed.is_terminal());
        assert!(!StageState::Started.is_terminal());
        assert!(!StageState::Executing.is_terminal());
    }

    #[test]
    fn test_result_value_from_rejected() {
        assert_eq!(ResultValue::from_rejected(0), ResultValue::Success);
        assert_eq!(ResultValue::from_rejected(3), ResultValue::Error);
    }

    #[test]
    fn test_confirmation_views() {
        assert_eq!(Confirmation::default(), Confirmation::Unknown);
        assert_eq!(Confirmation::from_success(true), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_success(false), Confirmation::Rejected);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&StageState::Executing).unwrap(), r#""Executing""#);
        assert_eq!(serde_json::to_string(&ResultValue::Failed).unwrap(), r#""Failed""#);
        assert_eq!(serde_json::to_string(&Confirmation::Confirmed).unwrap(), r#""confirmed""#);
    }
}
