//! ZIP container abstraction for OOXML packages.
//!
//! [`OoxmlContainer`] is the read-only view used by the deck reader; the
//! relationship helpers here are shared with the writable
//! [`Package`](crate::package::Package).

use crate::error::{Error, Result};
use crate::model::Metadata;
use quick_xml::events::Event;
use std::cell::RefCell;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Read};
use std::path::Path;

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

impl Relationship {
    /// Create an internal relationship.
    pub fn internal(
        id: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            external: false,
        }
    }
}

/// Ordered collection of relationships parsed from a .rels file.
///
/// Document order is kept so that a rewritten .rels part lists the surviving
/// entries the way the source package did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Get relationships by exact type URI.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.items.iter().filter(|r| r.rel_type == rel_type).collect()
    }

    /// First relationship of the given type, if any.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Add a relationship. An existing entry with the same ID is replaced.
    pub fn add(&mut self, rel: Relationship) {
        match self.items.iter_mut().find(|r| r.id == rel.id) {
            Some(existing) => *existing = rel,
            None => self.items.push(rel),
        }
    }

    /// Remove a relationship by ID, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Next free `rIdN` identifier.
    pub fn next_id(&self) -> String {
        let max = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Iterate over relationships in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize to a .rels part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.items.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.items {
            // Writing into a String cannot fail.
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_xml(&rel.id),
                escape_xml(&rel.rel_type),
                escape_xml(&rel.target)
            );
            if rel.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Escape XML special characters for attribute values and text nodes.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Parse the contents of a .rels part.
pub fn parse_relationships_xml(content: &str) -> Result<Relationships> {
    let mut rels = Relationships::new();
    if content.trim().is_empty() {
        return Ok(rels);
    }

    let mut reader = quick_xml::Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.name().local_name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut external = false;

                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"TargetMode" => external = value.eq_ignore_ascii_case("external"),
                        _ => {}
                    }
                }

                if !id.is_empty() {
                    rels.add(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Path of the .rels part that belongs to `part_path`.
///
/// `ppt/slides/slide1.xml` maps to `ppt/slides/_rels/slide1.xml.rels`; the
/// package root maps to `_rels/.rels`.
pub fn rels_path_for(part_path: &str) -> String {
    let part_path = part_path.trim_start_matches('/');
    if part_path.is_empty() {
        return "_rels/.rels".to_string();
    }
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Byte order of a UTF-16 encoded part.
#[derive(Debug, Clone, Copy)]
enum Utf16 {
    Le,
    Be,
}

impl Utf16 {
    fn decode(self, bytes: &[u8]) -> Result<String> {
        let units = bytes.chunks_exact(2).map(|pair| match self {
            Utf16::Le => u16::from_le_bytes([pair[0], pair[1]]),
            Utf16::Be => u16::from_be_bytes([pair[0], pair[1]]),
        });
        let text = char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| Error::XmlParse(format!("invalid UTF-16 part: {}", e)))?;
        Ok(declare_utf8(&text))
    }
}

/// The decoded text is UTF-8, so quick-xml must not see a UTF-16 declaration.
fn declare_utf8(xml: &str) -> String {
    let decl_end = match xml.starts_with("<?xml").then(|| xml.find("?>")).flatten() {
        Some(end) => end,
        None => return xml.to_string(),
    };
    let (decl, rest) = xml.split_at(decl_end);
    let decl = ["\"UTF-16\"", "'UTF-16'", "\"utf-16\"", "'utf-16'"]
        .iter()
        .fold(decl.to_string(), |d, quoted| {
            d.replace(&format!("encoding={}", quoted), "encoding=\"UTF-8\"")
        });
    format!("{}{}", decl, rest)
}

/// Decode a part as UTF-8 (BOM optional) or UTF-16 of either byte order.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec())
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8 part: {}", e)));
    }
    match bytes {
        [0xFF, 0xFE, rest @ ..] => return Utf16::Le.decode(rest),
        [0xFE, 0xFF, rest @ ..] => return Utf16::Be.decode(rest),
        _ => {}
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        // BOM-less UTF-16: ASCII markup leaves every other byte zero.
        Err(_) => match bytes {
            [_, 0, _, 0, ..] => Utf16::Le.decode(bytes),
            [0, _, 0, _, ..] => Utf16::Be.decode(bytes),
            _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

/// Read-only view of a presentation package held in memory.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Read a whole package file into memory.
    ///
    /// ```no_run
    /// use slidegen::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("deck.pptx")?;
    /// assert!(container.exists("ppt/presentation.xml"));
    /// # Ok::<(), slidegen::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Read an XML file from the archive as a string.
    ///
    /// Handles UTF-8 (with or without BOM) and UTF-16 LE/BE.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        decode_xml_bytes(&bytes)
    }

    /// Read a binary file from the archive.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.archive.borrow().index_for_name(path).is_some()
    }

    /// List all files in the archive, directories excluded.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(String::from)
            .collect()
    }

    /// Read and parse the relationships that belong to a part.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        match self.read_xml(&rels_path_for(part_path)) {
            Ok(content) => parse_relationships_xml(&content),
            Err(Error::MissingComponent(_)) => Ok(Relationships::new()),
            Err(e) => Err(e),
        }
    }

    /// Read package-level relationships (_rels/.rels).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.read_relationships("")
    }

    /// Core properties from `docProps/core.xml`; absent properties stay `None`.
    pub fn parse_core_metadata(&self) -> Result<Metadata> {
        let mut meta = Metadata::default();
        let xml = match self.read_xml("docProps/core.xml") {
            Ok(xml) => xml,
            Err(Error::MissingComponent(_)) => return Ok(meta),
            Err(e) => return Err(e),
        };

        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);
        let mut open = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => open = e.local_name().as_ref().to_vec(),
                Ok(Event::Text(t)) => {
                    let slot = match open.as_slice() {
                        b"title" => &mut meta.title,
                        b"creator" => &mut meta.author,
                        b"subject" => &mut meta.subject,
                        b"created" => &mut meta.created,
                        b"modified" => &mut meta.modified,
                        _ => continue,
                    };
                    *slot = Some(t.unescape().map(|v| v.into_owned()).unwrap_or_default());
                }
                Ok(Event::End(_)) => open.clear(),
                // A damaged core part only costs the metadata.
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
        }
        Ok(meta)
    }

    /// Resolve a relationship target against the part that owns the relationship.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(absolute) = relative.strip_prefix('/') {
            return absolute.to_string();
        }
        let mut parts: Vec<&str> = base.split('/').collect();
        parts.pop();
        for segment in relative.split('/') {
            match segment {
                ".." => {
                    parts.pop();
                }
                "." | "" => {}
                name => parts.push(name),
            }
        }
        parts.join("/")
    }

    /// Express `target` relative to the directory of `base`, the inverse of
    /// [`resolve_path`](Self::resolve_path).
    pub fn relative_target(base: &str, target: &str) -> String {
        let base_dir: Vec<&str> = match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').collect(),
            None => Vec::new(),
        };
        let target_parts: Vec<&str> = target.split('/').collect();

        let common = base_dir
            .iter()
            .zip(target_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = Vec::new();
        parts.extend(std::iter::repeat("..").take(base_dir.len() - common));
        parts.extend(&target_parts[common..]);
        parts.join("/")
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.list_files().len())
            .finish()
    }
}
