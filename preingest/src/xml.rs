//! Minimal element tree over `quick-xml` events.
//!
//! Metadata records are small; the rules need random access to children and
//! leaves, so records are read into an owned tree keyed by local names.
//! Namespaces are ignored: every dialect uses a single default namespace.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;
use thiserror::Error;

/// A parse failure with the reader position.
#[derive(Debug, Clone, Error)]
#[error("XML parse error at position {position}: {message}")]
pub struct XmlParseError {
    /// Byte offset in the input.
    pub position: u64,
    /// Parser message.
    pub message: String,
}

/// One element: local name, direct text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name, without prefix.
    pub name: String,
    /// Text and CDATA directly inside this element, concatenated as
    /// written. Whitespace-only runs between tags are dropped.
    pub text: String,
    /// Attributes as (local name, unescaped value).
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

impl XmlElement {
    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> Result<Self, XmlParseError> {
        Self::read(Reader::from_str(xml.trim_start_matches('\u{feff}')))
    }

    /// Parses raw bytes, decoding them as the BOM or the XML declaration
    /// says; UTF-8 when neither does.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, XmlParseError> {
        Self::read(Reader::from_reader(bytes))
    }

    /// Reads and parses a document from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content =
            std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
        Self::parse_bytes(&content)
            .with_context(|| format!("Failed to parse '{}'", path.display()))
    }

    fn read(mut reader: Reader<&[u8]>) -> Result<Self, XmlParseError> {
        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let position = reader.buffer_position() as u64;
            let fail = |message: String| XmlParseError { position, message };

            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| fail(e.to_string()))?;
            let decoder = reader.decoder();
            match event {
                Event::Start(start) => {
                    stack.push(Self::open(&start, decoder).map_err(fail)?);
                }
                Event::Empty(start) => {
                    let element = Self::open(&start, decoder).map_err(fail)?;
                    Self::close(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| fail("unbalanced end tag".to_string()))?;
                    Self::close(element, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let value = text.unescape().map_err(|e| fail(e.to_string()))?;
                        // Indentation between tags is not content.
                        if !value.chars().all(is_xml_whitespace) {
                            current.text.push_str(&value);
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        let value = decoder.decode(&data).map_err(|e| fail(e.to_string()))?;
                        current.text.push_str(&value);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlParseError {
                position: reader.buffer_position() as u64,
                message: format!("unclosed element '{}'", stack[stack.len() - 1].name),
            });
        }
        root.ok_or_else(|| XmlParseError {
            position: 0,
            message: "document has no root element".to_string(),
        })
    }

    fn open(start: &BytesStart<'_>, decoder: Decoder) -> Result<Self, String> {
        let decode = |bytes: &[u8]| {
            decoder
                .decode(bytes)
                .map(std::borrow::Cow::into_owned)
                .map_err(|e| e.to_string())
        };
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = decode(attr.key.local_name().as_ref())?;
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|e| e.to_string())?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name: decode(start.local_name().as_ref())?,
            text: String::new(),
            attributes,
            children: Vec::new(),
        })
    }

    fn close(element: Self, stack: &mut [Self], root: &mut Option<Self>) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    /// First child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follows a path of child names, taking the first match at each step.
    #[must_use]
    pub fn descend(&self, path: &[&str]) -> Option<&Self> {
        path.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Text of the element at `path`, if present.
    #[must_use]
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        self.descend(path).map(|e| e.text.as_str())
    }

    /// First child element, if any.
    #[must_use]
    pub fn first_child(&self) -> Option<&Self> {
        self.children.first()
    }

    /// Value of an attribute by local name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True if the element has no child elements.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Every leaf element carrying text, depth-first in document order.
    #[must_use]
    pub fn text_leaves(&self) -> Vec<&Self> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Self>) {
        if self.is_leaf() {
            if !self.text.is_empty() {
                out.push(self);
            }
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ToPX xmlns="http://www.nationaalarchief.nl/ToPX/v2.3">
  <bestand>
    <identificatiekenmerk>a.pdf</identificatiekenmerk>
    <openbaarheid>
      <omschrijvingBeperkingen>Niet openbaar</omschrijvingBeperkingen>
    </openbaarheid>
    <formaat><bestandsnaam><naam>a &amp; b.pdf</naam></bestandsnaam></formaat>
    <leeg/>
  </bestand>
</ToPX>"#;

    #[test]
    fn test_parse_tree() {
        let root = XmlElement::parse(TOPX).unwrap();
        assert_eq!(root.name, "ToPX");
        assert_eq!(root.first_child().unwrap().name, "bestand");
        assert_eq!(
            root.text_at(&["bestand", "openbaarheid", "omschrijvingBeperkingen"]),
            Some("Niet openbaar")
        );
        assert_eq!(
            root.text_at(&["bestand", "formaat", "bestandsnaam", "naam"]),
            Some("a & b.pdf")
        );
        assert!(root.descend(&["bestand", "missing"]).is_none());
    }

    #[test]
    fn test_text_leaves_skip_empty() {
        let root = XmlElement::parse(TOPX).unwrap();
        let names: Vec<_> = root.text_leaves().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["identificatiekenmerk", "omschrijvingBeperkingen", "naam"]);
    }

    #[test]
    fn test_prefixed_names_and_attributes() {
        let root = XmlElement::parse(
            r#"<opex:OPEXMetadata xmlns:opex="urn:x"><opex:File type="content" size="3">a.txt</opex:File></opex:OPEXMetadata>"#,
        )
        .unwrap();
        let file = root.child("File").unwrap();
        assert_eq!(file.attribute("type"), Some("content"));
        assert_eq!(file.attribute("size"), Some("3"));
        assert_eq!(file.text, "a.txt");
    }

    #[test]
    fn test_cdata_and_children_named() {
        let root = XmlElement::parse(
            "<MDTO><informatieobject><naam><![CDATA[x < y]]></naam><naam>z</naam></informatieobject></MDTO>",
        )
        .unwrap();
        let object = root.child("informatieobject").unwrap();
        let names: Vec<_> = object.children_named("naam").map(|e| e.text.as_str()).collect();
        assert_eq!(names, vec!["x < y", "z"]);
    }

    #[test]
    fn test_malformed_document() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("   ").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = XmlElement::load(Path::new("/nope/x.metadata")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_leaf_text_is_kept_as_written() {
        let root = XmlElement::parse(
            "<a>\n  <b>&#9;value</b>\n  <c> Openbaar\n</c>\n  <d><![CDATA[ x ]]></d>\n</a>",
        )
        .unwrap();
        assert_eq!(root.text, "");
        assert_eq!(root.text_at(&["b"]), Some("\tvalue"));
        assert_eq!(root.text_at(&["c"]), Some(" Openbaar\n"));
        assert_eq!(root.text_at(&["d"]), Some(" x "));
    }

    #[test]
    fn test_load_decodes_declared_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.metadata");
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><ToPX><naam>Caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</naam></ToPX>");
        std::fs::write(&path, bytes).unwrap();

        let root = XmlElement::load(&path).unwrap();

        assert_eq!(root.text_at(&["naam"]), Some("Café"));
    }

    #[test]
    fn test_parse_bytes_defaults_to_utf8() {
        let root = XmlElement::parse_bytes("<a b=\"é\">Café</a>".as_bytes()).unwrap();
        assert_eq!(root.text, "Café");
        assert_eq!(root.attribute("b"), Some("é"));
    }
}
