//! Parsed metadata records and their structural kind.

use std::path::Path;

use crate::context::MetadataDialect;
use crate::xml::{XmlElement, XmlParseError};

/// Element names shared by the dialects.
pub(crate) mod names {
    pub const INFORMATIEOBJECT: &str = "informatieobject";
    pub const BESTAND: &str = "bestand";
    pub const AGGREGATIE: &str = "aggregatie";
    pub const AGGREGATIENIVEAU: &str = "aggregatieniveau";
    pub const OPENBAARHEID: &str = "openbaarheid";
    pub const OMSCHRIJVING_BEPERKINGEN: &str = "omschrijvingBeperkingen";
    pub const BEPERKING_GEBRUIK: &str = "beperkingGebruik";
    pub const BEPERKING_GEBRUIK_TYPE: &str = "beperkingGebruikType";
    pub const BEPERKING_GEBRUIK_TERMIJN: &str = "beperkingGebruikTermijn";
    pub const BEGRIP_CODE: &str = "begripCode";
    pub const BEGRIP_LABEL: &str = "begripLabel";
    pub const TERMIJN_STARTDATUM: &str = "termijnStartdatumLooptijd";
    pub const TERMIJN_LOOPTIJD: &str = "termijnLooptijd";
    pub const TERMIJN_EINDDATUM: &str = "termijnEinddatum";
}

/// Structural kind of a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// MDTO information object.
    InformationObject,
    /// A file record (`bestand`) in either dialect.
    File,
    /// ToPX aggregation (archive, series, dossier or record).
    Aggregation,
    /// Anything else.
    Unknown,
}

/// A metadata record with its classification.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    root: XmlElement,
    kind: RecordKind,
}

impl MetadataRecord {
    /// Parses a record in a dialect.
    pub fn parse(xml: &str, dialect: MetadataDialect) -> Result<Self, XmlParseError> {
        Ok(Self::from_root(XmlElement::parse(xml)?, dialect))
    }

    /// Loads a record from disk.
    pub fn load(path: &Path, dialect: MetadataDialect) -> anyhow::Result<Self> {
        Ok(Self::from_root(XmlElement::load(path)?, dialect))
    }

    /// Classifies an already parsed root element.
    #[must_use]
    pub fn from_root(root: XmlElement, dialect: MetadataDialect) -> Self {
        let kind = match dialect {
            // ToPX records are typed by their first element.
            MetadataDialect::ToPX => match root.first_child().map(|c| c.name.as_str()) {
                Some(names::BESTAND) => RecordKind::File,
                Some(names::AGGREGATIE) => RecordKind::Aggregation,
                _ => RecordKind::Unknown,
            },
            MetadataDialect::Mdto => {
                if root.child(names::INFORMATIEOBJECT).is_some() {
                    RecordKind::InformationObject
                } else if root.child(names::BESTAND).is_some() {
                    RecordKind::File
                } else {
                    RecordKind::Unknown
                }
            }
        };
        Self { root, kind }
    }

    /// The record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// The element describing the record (`informatieobject`, `bestand`, `aggregatie`).
    #[must_use]
    pub fn body(&self) -> Option<&XmlElement> {
        match self.kind {
            RecordKind::InformationObject => self.root.child(names::INFORMATIEOBJECT),
            RecordKind::File => self.root.child(names::BESTAND),
            RecordKind::Aggregation => self.root.child(names::AGGREGATIE),
            RecordKind::Unknown => None,
        }
    }

    /// The ToPX aggregation level, e.g. `Dossier`.
    #[must_use]
    pub fn aggregation_level(&self) -> Option<&str> {
        self.root
            .text_at(&[names::AGGREGATIE, names::AGGREGATIENIVEAU])
    }
}
