//! Core domain model types for preingest stages.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage lifecycle state and verdict enums
//! - The tri-state confirmation used by optional checks
//! - The stage outcome with counters and item payload

mod outcome;
mod status;

pub use outcome::StageOutcome;
pub use status::{Confirmation, ResultValue, StageState};
