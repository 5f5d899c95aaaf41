//! Collection context for stage execution.
//!
//! This module provides:
//! - The read-only identity of the collection under test
//! - Metadata dialect detection and metadata file enumeration

mod collection;
mod dialect;

pub use collection::CollectionContext;
pub use dialect::MetadataDialect;
