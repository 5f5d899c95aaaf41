//! # Preingest
//!
//! Quality-gate stages an archival collection passes before it is accepted
//! into preservation storage.
//!
//! Preingest provides:
//!
//! - **Stage runner**: a uniform `Started → Executing* → Completed | Failed`
//!   lifecycle around any [`stages::StageBody`], with failure isolation
//! - **Metadata rules**: schema validation through a gateway plus temporal,
//!   vocabulary, openness and printable-character checks for ToPX and MDTO
//! - **Password detection**: password and macro inspection of PDF and Office
//!   documents
//! - **OPEX**: building and reverting OPEX sidecars for a collection
//! - **Lifecycle events**: immutable outcome snapshots pushed to an
//!   [`events::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use preingest::prelude::*;
//!
//! let settings = PreingestSettings::from_env()?;
//! let ctx = CollectionContext::detect(&settings, session_id, "upload.tar")?;
//! let stage = MetadataValidationStage::new(MetadataRuleEngine::from_settings(&settings));
//!
//! let outcome = run_stage(&stage, &ctx, &LoggingEventSink::default()).await;
//! println!("{}: {} rejected", outcome.result_value, outcome.rejected);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod gateways;
pub mod metadata;
pub mod observability;
pub mod opex;
pub mod stages;
pub mod xml;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::PreingestSettings;
    pub use crate::context::{CollectionContext, MetadataDialect};
    pub use crate::core::{Confirmation, ResultValue, StageOutcome, StageState};
    pub use crate::errors::{GatewayError, PreingestError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LifecycleEvent, LoggingEventSink, NoOpEventSink,
        StateMessage,
    };
    pub use crate::metadata::{MetadataRuleEngine, MetadataValidationItem};
    pub use crate::stages::{
        run_stage, MetadataValidationStage, OpexBuildStage, OpexRevertStage,
        PasswordDetectionStage, StageBody, StageProgress,
    };
}
