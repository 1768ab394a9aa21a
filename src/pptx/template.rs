//! Template decks: a loaded package plus its ordered slide layouts.

use super::layout::Layout;
use crate::container::OoxmlContainer;
use crate::detect::ensure_presentation;
use crate::error::{Error, Result};
use crate::package::{rel_type, Package};
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Layout index of the title slide.
pub const TITLE_LAYOUT: usize = 0;

/// Layout index of the title-and-content slide.
pub const CONTENT_LAYOUT: usize = 1;

/// An entry of `p:sldIdLst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideId {
    pub id: u32,
    pub rel_id: String,
}

/// A slide already present in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRef {
    pub id: u32,
    pub rel_id: String,
    pub part_name: String,
}

/// Slide dimensions in EMU, from `p:sldSz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub cx: i64,
    pub cy: i64,
}

#[derive(Debug, Default)]
pub(crate) struct PresentationInfo {
    pub master_rel_ids: Vec<String>,
    pub slides: Vec<SlideId>,
    pub slide_size: Option<SlideSize>,
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// The `r:id` of an element, whatever prefix the relationships namespace uses.
fn rel_id_of(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Read the master list, the slide list and the slide size from `presentation.xml`.
pub(crate) fn parse_presentation_xml(xml: &str) -> Result<PresentationInfo> {
    let mut info = PresentationInfo::default();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                match e.name().local_name().as_ref() {
                    b"sldMasterId" => {
                        if let Some(rel_id) = rel_id_of(e) {
                            info.master_rel_ids.push(rel_id);
                        }
                    }
                    b"sldId" => {
                        let id = attr_value(e, b"id").and_then(|v| v.parse().ok());
                        if let (Some(id), Some(rel_id)) = (id, rel_id_of(e)) {
                            info.slides.push(SlideId { id, rel_id });
                        }
                    }
                    b"sldSz" => {
                        let cx = attr_value(e, b"cx").and_then(|v| v.parse().ok());
                        let cy = attr_value(e, b"cy").and_then(|v| v.parse().ok());
                        if let (Some(cx), Some(cy)) = (cx, cy) {
                            info.slide_size = Some(SlideSize { cx, cy });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

/// Relationship ids of `p:sldLayoutId` entries in a slide master, in order.
fn parse_master_layout_ids(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().local_name().as_ref() == b"sldLayoutId" =>
            {
                if let Some(rel_id) = rel_id_of(e) {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

/// A template deck ready to build presentations from.
///
/// Layouts are those of the first slide master, in the master's order, so
/// index 0 is conventionally the title slide and index 1 title-and-content.
#[derive(Debug, Clone)]
pub struct Template {
    package: Package,
    presentation_path: String,
    layouts: Vec<Layout>,
    slides: Vec<SlideRef>,
    slide_size: Option<SlideSize>,
}

impl Template {
    /// Load a template from a `.pptx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Load a template from `.pptx` bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        ensure_presentation(&data)?;
        Self::from_package(Package::from_bytes(data)?)
    }

    /// Index an already loaded package.
    pub fn from_package(package: Package) -> Result<Self> {
        let presentation_path = package.main_document_part()?;
        let presentation_rels = package.relationships(&presentation_path)?;
        let info = parse_presentation_xml(&package.read_xml(&presentation_path)?)?;

        let master_path = match info.master_rel_ids.first() {
            Some(rel_id) => presentation_rels.get(rel_id).map(|r| r.target.clone()),
            None => presentation_rels
                .first_of_type(rel_type::SLIDE_MASTER)
                .map(|r| r.target.clone()),
        }
        .map(|target| OoxmlContainer::resolve_path(&presentation_path, &target))
        .ok_or_else(|| Error::MissingComponent("slide master".to_string()))?;

        let layouts = Self::load_layouts(&package, &master_path)?;

        let slides = info
            .slides
            .into_iter()
            .map(|slide| -> Result<SlideRef> {
                let rel = presentation_rels.get(&slide.rel_id).ok_or_else(|| {
                    Error::InvalidData(format!(
                        "slide {} references missing relationship {}",
                        slide.id, slide.rel_id
                    ))
                })?;
                Ok(SlideRef {
                    id: slide.id,
                    part_name: OoxmlContainer::resolve_path(&presentation_path, &rel.target),
                    rel_id: slide.rel_id,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "template indexed: {} layouts, {} existing slides",
            layouts.len(),
            slides.len()
        );

        Ok(Self {
            package,
            presentation_path,
            layouts,
            slides,
            slide_size: info.slide_size,
        })
    }

    fn load_layouts(package: &Package, master_path: &str) -> Result<Vec<Layout>> {
        let master_rels = package.relationships(master_path)?;
        let listed = parse_master_layout_ids(&package.read_xml(master_path)?)?;

        let targets: Vec<String> = if listed.is_empty() {
            master_rels
                .get_by_type(rel_type::SLIDE_LAYOUT)
                .into_iter()
                .map(|r| r.target.clone())
                .collect()
        } else {
            listed
                .iter()
                .map(|rel_id| {
                    master_rels.get(rel_id).map(|r| r.target.clone()).ok_or_else(|| {
                        Error::InvalidData(format!(
                            "slide master references missing relationship {}",
                            rel_id
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        targets
            .iter()
            .map(|target| -> Result<Layout> {
                let part_name = OoxmlContainer::resolve_path(master_path, target);
                let xml = package.read_xml(&part_name)?;
                Layout::parse(part_name, &xml)
            })
            .collect()
    }

    /// Check that the title and content layouts exist and carry a title
    /// placeholder.
    pub fn validate(&self) -> Result<()> {
        for index in [TITLE_LAYOUT, CONTENT_LAYOUT] {
            let layout = self.layout(index)?;
            if layout.title_placeholder().is_none() {
                return Err(Error::MissingTitle(layout.name.clone()));
            }
        }
        Ok(())
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn layout(&self, index: usize) -> Result<&Layout> {
        self.layouts.get(index).ok_or(Error::MissingLayout(index))
    }

    /// Slides already present in the template file.
    pub fn slides(&self) -> &[SlideRef] {
        &self.slides
    }

    pub fn slide_size(&self) -> Option<SlideSize> {
        self.slide_size
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn presentation_path(&self) -> &str {
        &self.presentation_path
    }
}
