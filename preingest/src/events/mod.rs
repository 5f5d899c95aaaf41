//! Lifecycle event emission.
//!
//! Stages report progress through an [`EventSink`]; the events carry an
//! immutable snapshot of the stage outcome and can be turned into persisted
//! [`StateMessage`] rows.

mod lifecycle;
mod sink;

pub use lifecycle::{LifecycleEvent, StateMessage};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
