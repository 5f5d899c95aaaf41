//! Stage bodies and the runner that gives them a uniform lifecycle.
//!
//! A stage is a [`StageBody`]: it enumerates its items, evaluates each one
//! and records it through [`StageProgress`]. [`run_stage`] wraps the body
//! with lifecycle events, failure isolation and the final verdict.

pub mod aggregate;
mod metadata;
mod opex;
mod password;
mod progress;
mod runner;
#[cfg(test)]
mod runner_tests;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::CollectionContext;
use crate::errors::PreingestError;

pub use aggregate::Tally;
pub use metadata::MetadataValidationStage;
pub use opex::{OpexBuildItem, OpexBuildStage, OpexRevertItem, OpexRevertStage};
pub use password::{PasswordDetectionItem, PasswordDetectionStage};
pub use progress::{AcceptFn, StageProgress};
pub use runner::run_stage;

/// The business logic of one stage.
///
/// Errors returned from [`StageBody::execute`] are stage-level failures;
/// problems with a single item must be turned into a rejected item instead.
#[async_trait]
pub trait StageBody: Send + Sync {
    /// The per-item result.
    type Item: Serialize + Send + Sync;

    /// Stage name, used in outcomes and logs.
    fn name(&self) -> &str;

    /// Description of the `Started` event.
    fn started_description(&self, ctx: &CollectionContext) -> String;

    /// Description of the `Completed` event.
    fn completed_description(&self, ctx: &CollectionContext) -> String;

    /// First line of the failure diagnostic and description of the `Failed` event.
    fn failure_summary(&self, ctx: &CollectionContext) -> String;

    /// The accept predicate used for counting.
    fn is_accepted(&self, item: &Self::Item) -> bool;

    /// Enumerates and evaluates the items, recording each one.
    async fn execute(
        &self,
        ctx: &CollectionContext,
        progress: &mut StageProgress<'_, Self::Item>,
    ) -> Result<(), PreingestError>;
}
