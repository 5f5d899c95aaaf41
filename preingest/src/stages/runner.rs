//! Uniform lifecycle around a stage body.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info};

use super::aggregate;
use super::progress::StageProgress;
use super::StageBody;
use crate::context::CollectionContext;
use crate::core::{StageOutcome, StageState};
use crate::errors::{failure_lines, PreingestError};
use crate::events::{EventSink, LifecycleEvent};
use crate::observability::SpanTimer;

/// Runs a stage body through `Started → Executing* → Completed | Failed`.
///
/// Item-level problems are the body's concern and end up as rejected items.
/// An error or panic escaping the body fails the whole stage: nothing is
/// accepted, every attempted item counts as rejected, and a three-line
/// diagnostic is appended to the stage messages. Exactly one terminal event
/// is emitted.
pub async fn run_stage<B>(
    body: &B,
    ctx: &CollectionContext,
    sink: &dyn EventSink,
) -> StageOutcome<B::Item>
where
    B: StageBody + ?Sized,
{
    let timer = SpanTimer::start(body.name());
    let accept = |item: &B::Item| body.is_accepted(item);
    let mut progress = StageProgress::new(body.name(), sink, &accept);

    info!(stage = body.name(), session_id = %ctx.session_id, "Stage started");
    sink.emit(&LifecycleEvent::new(
        StageState::Started,
        body.started_description(ctx),
        progress.snapshot(),
    ))
    .await;

    let result = AssertUnwindSafe(body.execute(ctx, &mut progress))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(PreingestError::Internal(panic_message(panic.as_ref()))));
    let mut outcome = progress.into_outcome();

    match result {
        Ok(()) => {
            aggregate::finalize(&mut outcome, |item| body.is_accepted(item));
            info!(
                stage = body.name(),
                processed = outcome.processed,
                accepted = outcome.accepted,
                rejected = outcome.rejected,
                result = %outcome.result_value,
                duration_ms = timer.elapsed_ms(),
                "Stage completed"
            );
            sink.emit(&LifecycleEvent::new(
                StageState::Completed,
                body.completed_description(ctx),
                outcome.snapshot(),
            ))
            .await;
        }
        Err(err) => {
            let summary = body.failure_summary(ctx);
            error!(
                stage = body.name(),
                processed = outcome.processed,
                error = %err,
                duration_ms = timer.elapsed_ms(),
                "{summary}"
            );
            aggregate::fail(
                &mut outcome,
                failure_lines(summary.clone(), &anyhow::Error::new(err)),
            );
            sink.emit(&LifecycleEvent::new(
                StageState::Failed,
                summary,
                outcome.snapshot(),
            ))
            .await;
        }
    }
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("stage body panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("stage body panicked: {message}")
    } else {
        "stage body panicked".to_string()
    }
}
