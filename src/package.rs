//! Writable OPC package: an in-memory part set that can be edited and
//! serialized back to a ZIP archive.

use crate::container::{
    decode_xml_bytes, escape_xml, parse_relationships_xml, rels_path_for, OoxmlContainer,
    Relationships,
};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Content type URIs used by presentation packages.
pub mod content_type {
    pub const PML_PRESENTATION_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const PML_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const PML_SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const PML_SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const DML_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const OPC_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const OFC_EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const XML: &str = "application/xml";
    /// MIME type of a whole `.pptx` file, used for downloads.
    pub const PPTX_FILE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";
}

/// Relationship type URIs used by presentation packages.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
}

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

#[derive(Debug, Deserialize)]
struct TypesXml {
    #[serde(rename = "$value", default)]
    entries: Vec<TypeEntryXml>,
}

#[derive(Debug, Deserialize)]
enum TypeEntryXml {
    Default {
        #[serde(rename = "@Extension")]
        extension: String,
        #[serde(rename = "@ContentType")]
        content_type: String,
    },
    Override {
        #[serde(rename = "@PartName")]
        part_name: String,
        #[serde(rename = "@ContentType")]
        content_type: String,
    },
}

/// The `[Content_Types].xml` part: extension defaults plus per-part overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Create an empty content type map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `[Content_Types].xml`.
    pub fn parse(xml: &str) -> Result<Self> {
        let parsed: TypesXml = quick_xml::de::from_str(xml)?;
        let mut types = Self::new();
        for entry in parsed.entries {
            match entry {
                TypeEntryXml::Default {
                    extension,
                    content_type,
                } => types.add_default(extension, content_type),
                TypeEntryXml::Override {
                    part_name,
                    content_type,
                } => types.add_override(part_name, content_type),
            }
        }
        Ok(types)
    }

    /// Register a default content type for an extension (without the dot).
    pub fn add_default(&mut self, extension: impl Into<String>, content_type: impl Into<String>) {
        let extension = extension.into().to_ascii_lowercase();
        let content_type = content_type.into();
        match self.defaults.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(entry) => entry.1 = content_type,
            None => self.defaults.push((extension, content_type)),
        }
    }

    /// Register an override for a part. Part names are stored with a leading slash.
    pub fn add_override(&mut self, part_name: impl Into<String>, content_type: impl Into<String>) {
        let part_name = normalize_part_name(&part_name.into());
        let content_type = content_type.into();
        match self.overrides.iter_mut().find(|(name, _)| *name == part_name) {
            Some(entry) => entry.1 = content_type,
            None => self.overrides.push((part_name, content_type)),
        }
    }

    /// Remove the override for a part, if present.
    pub fn remove_override(&mut self, part_name: &str) -> bool {
        let part_name = normalize_part_name(part_name);
        let before = self.overrides.len();
        self.overrides.retain(|(name, _)| *name != part_name);
        self.overrides.len() != before
    }

    /// Effective content type of a part: its override, else the extension default.
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let part_name = normalize_part_name(part_name);
        if let Some((_, ct)) = self.overrides.iter().find(|(name, _)| *name == part_name) {
            return Some(ct);
        }
        let ext = part_name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }

    /// Part names (without leading slash) whose override has the given type.
    pub fn parts_of_type(&self, content_type: &str) -> Vec<String> {
        self.overrides
            .iter()
            .filter(|(_, ct)| ct == content_type)
            .map(|(name, _)| name.trim_start_matches('/').to_string())
            .collect()
    }

    /// Serialize to `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        for (ext, ct) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            );
        }
        for (name, ct) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(name),
                escape_xml(ct)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

fn normalize_part_name(name: &str) -> String {
    format!("/{}", name.trim_start_matches('/'))
}

/// An editable OPC package held entirely in memory.
///
/// Part names are stored without a leading slash, exactly as they appear in
/// the ZIP central directory.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every part of a `.pptx` (or any OOXML) archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        Self::from_container(&container)
    }

    /// Snapshot every part of an opened container.
    pub fn from_container(container: &OoxmlContainer) -> Result<Self> {
        let mut parts = BTreeMap::new();
        for name in container.list_files() {
            let data = container.read_binary(&name)?;
            parts.insert(name, data);
        }
        if !parts.contains_key(CONTENT_TYPES_PART) {
            return Err(Error::MissingComponent(CONTENT_TYPES_PART.to_string()));
        }
        Ok(Self { parts })
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .get(name.trim_start_matches('/'))
            .map(|d| d.as_slice())
    }

    /// Check whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name.trim_start_matches('/'))
    }

    /// Decoded XML text of a part.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::MissingComponent(name.to_string()))?;
        decode_xml_bytes(data)
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: impl AsRef<str>, data: impl Into<Vec<u8>>) {
        self.parts
            .insert(name.as_ref().trim_start_matches('/').to_string(), data.into());
    }

    /// Remove a part, returning its bytes.
    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name.trim_start_matches('/'))
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|k| k.as_str())
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the package has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Relationships owned by a part; empty when the part has no .rels.
    pub fn relationships(&self, part_name: &str) -> Result<Relationships> {
        match self.part(&rels_path_for(part_name)) {
            Some(data) => parse_relationships_xml(&decode_xml_bytes(data)?),
            None => Ok(Relationships::new()),
        }
    }

    /// Replace the relationships owned by a part.
    pub fn set_relationships(&mut self, part_name: &str, rels: &Relationships) {
        self.set_part(rels_path_for(part_name), rels.to_xml());
    }

    /// Resolve the main document part through the package relationships.
    pub fn main_document_part(&self) -> Result<String> {
        let rels = self.relationships("")?;
        rels.first_of_type(crate::package::rel_type::OFFICE_DOCUMENT)
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
            .ok_or_else(|| Error::MissingComponent("officeDocument relationship".to_string()))
    }

    /// Parsed `[Content_Types].xml`.
    pub fn content_types(&self) -> Result<ContentTypes> {
        ContentTypes::parse(&self.read_xml(CONTENT_TYPES_PART)?)
    }

    /// Replace `[Content_Types].xml`.
    pub fn set_content_types(&mut self, types: &ContentTypes) {
        self.set_part(CONTENT_TYPES_PART, types.to_xml());
    }

    /// Serialize the package to ZIP bytes.
    ///
    /// `[Content_Types].xml` is written first, then the remaining parts in name order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let content_types = self
            .parts
            .get(CONTENT_TYPES_PART)
            .ok_or_else(|| Error::MissingComponent(CONTENT_TYPES_PART.to_string()))?;
        zip.start_file(CONTENT_TYPES_PART, options)?;
        zip.write_all(content_types)?;

        for (name, data) in self.parts.iter().filter(|(n, _)| *n != CONTENT_TYPES_PART) {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}
