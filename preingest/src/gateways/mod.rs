//! Adapters to the external services and collaborators the stages call.
//!
//! Every gateway is a trait so stages can run against in-memory fakes; the
//! HTTP implementations are behind the `http` feature.

mod inventory;
mod macros;
mod password;
mod schema;
mod vocabulary;

pub use inventory::{EntryType, FormatInventory, FormatRecord};
#[cfg(test)]
pub use macros::MockMacroScanner;
#[cfg(feature = "http")]
pub use macros::UtilitiesMacroScanner;
pub use macros::{MacroFinding, MacroReport, MacroScanner};
pub use password::{DocumentKind, PasswordInspector, CANDIDATE_EXTENSIONS};
#[cfg(feature = "http")]
pub use schema::XslWebSchemaGateway;
pub use schema::{
    ReportSection, SchemaFinding, SchemaReport, SchemaRequest, SchemaValidator, SchematronFinding,
};
#[cfg(feature = "http")]
pub use vocabulary::UtilitiesVocabularyGateway;
pub use vocabulary::{Beperking, BeperkingCategory, StaticVocabulary, VocabularyLookup};
