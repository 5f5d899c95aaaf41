//! OPEX (Open Preservation Exchange) sidecar documents.
//!
//! Only the transfer manifest and the basic properties are modelled; fixity
//! values are not produced.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::xml::{XmlElement, XmlParseError};

/// Namespace of OPEX 1.1 documents.
pub const OPEX_NAMESPACE: &str = "http://www.openpreservationexchange.org/opex/v1.1";

/// File extension of OPEX sidecars, without the dot.
pub const OPEX_EXTENSION: &str = "opex";

/// Failure while serializing an OPEX document.
#[derive(Debug, Clone, Error)]
#[error("Failed to write OPEX document: {0}")]
pub struct OpexWriteError(pub String);

/// Root of an OPEX document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpexMetadata {
    /// Transfer section: what is being delivered.
    pub transfer: Option<Transfer>,
    /// Descriptive properties of the described entity.
    pub properties: Option<Properties>,
}

/// The `Transfer` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Identifier of the entity at the source.
    pub source_id: Option<String>,
    /// Content of the folder being transferred.
    pub manifest: Option<Manifest>,
    /// Name of the entity before the transfer.
    pub original_filename: Option<String>,
}

/// Direct files and sub-folders of a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Files, in listing order.
    pub files: Vec<ManifestFile>,
    /// Sub-folder names, in listing order.
    pub folders: Vec<String>,
}

/// One file entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Content or metadata.
    pub kind: FileKind,
    /// Size in bytes, when known.
    pub size: Option<u64>,
    /// Path relative to the folder.
    pub path: String,
}

/// Role of a manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A content file.
    Content,
    /// A metadata sidecar.
    Metadata,
}

impl FileKind {
    /// The `type` attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Metadata => "metadata",
        }
    }

    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("metadata") {
            Self::Metadata
        } else {
            Self::Content
        }
    }
}

/// The `Properties` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Security descriptor, e.g. `open` or `closed`.
    pub security_descriptor: Option<String>,
    /// Additional identifiers.
    pub identifiers: Vec<Identifier>,
}

/// A typed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier scheme.
    pub kind: Option<String>,
    /// Identifier value.
    pub value: String,
}

impl OpexMetadata {
    /// A document describing a folder through its manifest.
    #[must_use]
    pub fn for_folder(source_id: impl Into<String>, manifest: Manifest) -> Self {
        Self {
            transfer: Some(Transfer {
                source_id: Some(source_id.into()),
                manifest: Some(manifest),
                original_filename: None,
            }),
            properties: None,
        }
    }

    /// Serializes to an indented XML document with the `opex` prefix.
    pub fn to_xml(&self) -> Result<String, OpexWriteError> {
        let mut out = OpexWriter::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        out.event(Event::Start(
            BytesStart::new("opex:OPEXMetadata").with_attributes([("xmlns:opex", OPEX_NAMESPACE)]),
        ))?;

        if let Some(transfer) = &self.transfer {
            out.start("opex:Transfer")?;
            out.optional("opex:SourceID", transfer.source_id.as_deref())?;
            if let Some(manifest) = &transfer.manifest {
                out.start("opex:Manifest")?;
                if !manifest.files.is_empty() {
                    out.start("opex:Files")?;
                    for file in &manifest.files {
                        let size = file.size.map(|s| s.to_string());
                        let mut start = BytesStart::new("opex:File")
                            .with_attributes([("type", file.kind.as_str())]);
                        if let Some(size) = &size {
                            start.push_attribute(("size", size.as_str()));
                        }
                        out.with_text(start, &file.path)?;
                    }
                    out.end("opex:Files")?;
                }
                if !manifest.folders.is_empty() {
                    out.start("opex:Folders")?;
                    for folder in &manifest.folders {
                        out.text("opex:Folder", folder)?;
                    }
                    out.end("opex:Folders")?;
                }
                out.end("opex:Manifest")?;
            }
            out.optional("opex:OriginalFilename", transfer.original_filename.as_deref())?;
            out.end("opex:Transfer")?;
        }

        if let Some(properties) = &self.properties {
            out.start("opex:Properties")?;
            out.optional("opex:Title", properties.title.as_deref())?;
            out.optional("opex:Description", properties.description.as_deref())?;
            out.optional(
                "opex:SecurityDescriptor",
                properties.security_descriptor.as_deref(),
            )?;
            if !properties.identifiers.is_empty() {
                out.start("opex:Identifiers")?;
                for identifier in &properties.identifiers {
                    let mut start = BytesStart::new("opex:Identifier");
                    if let Some(kind) = &identifier.kind {
                        start.push_attribute(("type", kind.as_str()));
                    }
                    out.with_text(start, &identifier.value)?;
                }
                out.end("opex:Identifiers")?;
            }
            out.end("opex:Properties")?;
        }

        out.end("opex:OPEXMetadata")?;
        out.finish()
    }

    /// Reads a document; prefixes are ignored.
    pub fn parse(xml: &str) -> Result<Self, XmlParseError> {
        let root = XmlElement::parse(xml)?;
        if root.name != "OPEXMetadata" {
            return Err(XmlParseError {
                position: 0,
                message: format!("expected OPEXMetadata, found '{}'", root.name),
            });
        }
        let text = |element: &XmlElement, name: &str| {
            element
                .child(name)
                .map(|c| c.text.clone())
                .filter(|t| !t.is_empty())
        };

        let transfer = root.child("Transfer").map(|transfer| Transfer {
            source_id: text(transfer, "SourceID"),
            manifest: transfer.child("Manifest").map(|manifest| Manifest {
                files: manifest
                    .child("Files")
                    .map(|files| {
                        files
                            .children_named("File")
                            .map(|file| ManifestFile {
                                kind: FileKind::parse(file.attribute("type").unwrap_or_default()),
                                size: file.attribute("size").and_then(|s| s.parse().ok()),
                                path: file.text.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                folders: manifest
                    .child("Folders")
                    .map(|folders| {
                        folders
                            .children_named("Folder")
                            .map(|f| f.text.clone())
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            original_filename: text(transfer, "OriginalFilename"),
        });

        let properties = root.child("Properties").map(|properties| Properties {
            title: text(properties, "Title"),
            description: text(properties, "Description"),
            security_descriptor: text(properties, "SecurityDescriptor"),
            identifiers: properties
                .child("Identifiers")
                .map(|ids| {
                    ids.children_named("Identifier")
                        .map(|id| Identifier {
                            kind: id.attribute("type").map(str::to_string),
                            value: id.text.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        });

        Ok(Self {
            transfer,
            properties,
        })
    }
}

struct OpexWriter {
    writer: Writer<Vec<u8>>,
}

impl OpexWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), OpexWriteError> {
        self.writer
            .write_event(event)
            .map_err(|e| OpexWriteError(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<(), OpexWriteError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), OpexWriteError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn with_text(&mut self, start: BytesStart<'_>, text: &str) -> Result<(), OpexWriteError> {
        let end = start.to_end().into_owned();
        self.event(Event::Start(start))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.event(Event::End(end))
    }

    fn text(&mut self, name: &str, text: &str) -> Result<(), OpexWriteError> {
        self.with_text(BytesStart::new(name), text)
    }

    fn optional(&mut self, name: &str, text: Option<&str>) -> Result<(), OpexWriteError> {
        match text {
            Some(text) => self.text(name, text),
            None => Ok(()),
        }
    }

    fn finish(self) -> Result<String, OpexWriteError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| OpexWriteError(e.to_string()))
    }
}
