//! Metadata rule engine.
//!
//! This module provides:
//! - Parsing and classification of ToPX and MDTO records
//! - The individual rules (restriction periods, vocabulary, openness, printable text)
//! - [`MetadataRuleEngine`], which runs them for one file

mod engine;
mod item;
mod openness;
mod printable;
mod record;
mod temporal;
mod vocabulary;

pub use engine::MetadataRuleEngine;
pub use item::MetadataValidationItem;
pub use openness::{check_openness, companion_path, OPENNESS_VALUES};
pub use printable::non_printable_findings;
pub use record::{MetadataRecord, RecordKind};
pub use temporal::{
    check_restriction_periods, parse_instant, EndOrdering, IsoDuration, RestrictionPeriod,
    TemporalFinding,
};
pub use vocabulary::{
    check_against, check_all, declared_restrictions, RestrictionCheck, VocabularyVerdict,
};
