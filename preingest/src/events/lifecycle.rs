//! Lifecycle events and their persisted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{StageOutcome, StageState};

/// An event emitted by the stage runner.
///
/// The outcome is a snapshot taken at emission time; later changes to the
/// running stage are not visible through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Human readable description.
    pub description: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The stage state this event reports.
    pub stage_state: StageState,
    /// The stage outcome as it stood when the event was emitted.
    pub outcome: StageOutcome<serde_json::Value>,
}

impl LifecycleEvent {
    /// Creates an event from a snapshot.
    #[must_use]
    pub fn new(
        stage_state: StageState,
        description: impl Into<String>,
        outcome: StageOutcome<serde_json::Value>,
    ) -> Self {
        Self {
            description: description.into(),
            timestamp: Utc::now(),
            stage_state,
            outcome,
        }
    }

    /// The dotted event type, e.g. `stage.completed`.
    #[must_use]
    pub fn event_type(&self) -> String {
        format!("stage.{}", self.stage_state.to_string().to_ascii_lowercase())
    }

    /// Converts the event into a persisted state row.
    #[must_use]
    pub fn to_state_message(&self, status_id: Uuid) -> StateMessage {
        StateMessage {
            message_id: Uuid::new_v4(),
            status_id,
            status: self.stage_state,
            creation: self.timestamp,
            description: self.description.clone(),
        }
    }
}

/// One persisted row per lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Row identifier.
    pub message_id: Uuid,
    /// The action/status this row belongs to.
    pub status_id: Uuid,
    /// The reported state.
    pub status: StageState,
    /// When the event occurred.
    pub creation: DateTime<Utc>,
    /// Free-text description.
    pub description: String,
}
