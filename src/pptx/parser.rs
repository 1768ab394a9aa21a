//! Reads a generated (or template) deck back into the document model.

use super::template::{parse_presentation_xml, SlideId};
use crate::container::{OoxmlContainer, Relationships};
use crate::error::{Error, Result};
use crate::model::{
    Document, Paragraph, Section, TextAlignment, TextRole, TextRun, TextStyle,
};
use crate::package::rel_type;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Parser for PPTX (PowerPoint) presentations.
///
/// Reads slides in `sldIdLst` order and turns each one into a [`Section`]:
/// paragraphs take their [`TextRole`] from the placeholder that holds them,
/// and text boxes read as body text.
pub struct PptxParser {
    container: OoxmlContainer,
    presentation_path: String,
    slides: Vec<SlideId>,
    relationships: Relationships,
}

impl PptxParser {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_container(OoxmlContainer::open(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_container(OoxmlContainer::from_bytes(data)?)
    }

    fn from_container(container: OoxmlContainer) -> Result<Self> {
        let presentation_path = Self::find_presentation(&container)?;
        let relationships = container.read_relationships(&presentation_path)?;
        let slides = parse_presentation_xml(&container.read_xml(&presentation_path)?)?.slides;

        Ok(Self {
            container,
            presentation_path,
            slides,
            relationships,
        })
    }

    /// Locate the presentation part through the package relationships.
    fn find_presentation(container: &OoxmlContainer) -> Result<String> {
        let rels = container.read_package_relationships()?;
        match rels.first_of_type(rel_type::OFFICE_DOCUMENT) {
            Some(rel) => Ok(OoxmlContainer::resolve_path("", &rel.target)),
            None if container.exists("ppt/presentation.xml") => {
                Ok("ppt/presentation.xml".to_string())
            }
            None => Err(Error::MissingComponent("ppt/presentation.xml".to_string())),
        }
    }

    /// Read every slide, in `sldIdLst` order.
    pub fn parse(&self) -> Result<Document> {
        let mut metadata = self.container.parse_core_metadata()?;
        metadata.slide_count = Some(self.slides.len() as u32);

        let mut doc = Document {
            metadata,
            sections: Vec::with_capacity(self.slides.len()),
        };
        for (idx, slide) in self.slides.iter().enumerate() {
            let xml = self.container.read_xml(&self.slide_path(slide)?)?;
            let mut section = Section::with_name(idx, format!("Slide {}", idx + 1));
            section.paragraphs = parse_slide_text(&xml)?;
            doc.add_section(section);
        }
        Ok(doc)
    }

    /// Resolve the part name of a slide from its presentation relationship.
    fn slide_path(&self, slide: &SlideId) -> Result<String> {
        let rel = self.relationships.get(&slide.rel_id).ok_or_else(|| {
            Error::InvalidData(format!(
                "slide {} references missing relationship {}",
                slide.id, slide.rel_id
            ))
        })?;
        Ok(OoxmlContainer::resolve_path(
            &self.presentation_path,
            &rel.target,
        ))
    }

    /// Part names of the slides, in presentation order.
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        self.slides.iter().map(|s| self.slide_path(s)).collect()
    }

    /// Slide ids from `sldIdLst`, in presentation order.
    pub fn slide_ids(&self) -> Vec<u32> {
        self.slides.iter().map(|s| s.id).collect()
    }

    pub fn container(&self) -> &OoxmlContainer {
        &self.container
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

fn is_true(value: &str) -> bool {
    value != "0" && value != "false"
}

fn apply_run_properties(e: &BytesStart<'_>, style: &mut TextStyle) {
    for attr in e.attributes().flatten() {
        let val = String::from_utf8_lossy(&attr.value);
        match attr.key.local_name().as_ref() {
            b"b" => style.bold = is_true(&val),
            b"i" => style.italic = is_true(&val),
            b"u" => style.underline = val != "none",
            b"sz" => style.size = val.parse().ok(),
            _ => {}
        }
    }
}

fn apply_paragraph_properties(e: &BytesStart<'_>, para: &mut Paragraph) {
    for attr in e.attributes().flatten() {
        let val = String::from_utf8_lossy(&attr.value);
        match attr.key.local_name().as_ref() {
            b"algn" => {
                if let Some(alignment) = TextAlignment::from_drawingml(&val) {
                    para.alignment = alignment;
                }
            }
            b"lvl" => para.level = val.parse().unwrap_or(0),
            _ => {}
        }
    }
}

fn role_for_placeholder(e: &BytesStart<'_>) -> TextRole {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"type")
        .map(|a| TextRole::from_placeholder_type(&String::from_utf8_lossy(&a.value)))
        .unwrap_or_default()
}

/// Parse the text of a slide.
///
/// Text is found in `p:sp/p:txBody/a:p/a:r/a:t`. Paragraphs without text are
/// dropped; shapes are visited in document (z-) order.
pub fn parse_slide_text(xml: &str) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Vec::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    // Don't trim text - preserve whitespace from xml:space="preserve" elements
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut in_shape = false;
    let mut in_txbody = false;
    let mut in_run = false;
    let mut in_text = false;
    let mut current_role = TextRole::Body;
    let mut current_para: Option<Paragraph> = None;
    let mut current_text = String::new();
    let mut current_style = TextStyle::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().local_name().as_ref() {
                b"sp" => {
                    in_shape = true;
                    current_role = TextRole::Body;
                }
                b"txBody" if in_shape => in_txbody = true,
                b"p" if in_txbody => {
                    current_para = Some(Paragraph::new(current_role));
                }
                b"pPr" => {
                    if let Some(para) = current_para.as_mut() {
                        apply_paragraph_properties(e, para);
                    }
                }
                b"r" if current_para.is_some() => {
                    in_run = true;
                    current_text.clear();
                    current_style = TextStyle::default();
                }
                b"rPr" if in_run => apply_run_properties(e, &mut current_style),
                b"t" if in_run => in_text = true,
                b"br" => {
                    if let Some(para) = current_para.as_mut() {
                        para.add_run(TextRun::plain("\n"));
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().local_name().as_ref() {
                b"ph" if in_shape => current_role = role_for_placeholder(e),
                b"pPr" => {
                    if let Some(para) = current_para.as_mut() {
                        apply_paragraph_properties(e, para);
                    }
                }
                b"rPr" if in_run => apply_run_properties(e, &mut current_style),
                b"br" => {
                    if let Some(para) = current_para.as_mut() {
                        para.add_run(TextRun::plain("\n"));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_text {
                    let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().local_name().as_ref() {
                b"t" => in_text = false,
                b"r" if in_run => {
                    if let Some(para) = current_para.as_mut() {
                        if !current_text.is_empty() {
                            para.add_run(TextRun::styled(
                                std::mem::take(&mut current_text),
                                current_style.clone(),
                            ));
                        }
                    }
                    in_run = false;
                }
                b"p" => {
                    if let Some(para) = current_para.take() {
                        if !para.is_empty() {
                            paragraphs.push(para);
                        }
                    }
                }
                b"txBody" => in_txbody = false,
                b"sp" => {
                    in_shape = false;
                    current_role = TextRole::Body;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld>
    <p:spTree>
      <p:sp>
        <p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr>
        <p:spPr/>
        <p:txBody><a:bodyPr/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US"/><a:t>Rust &amp; You</a:t></a:r></a:p></p:txBody>
      </p:sp>
      <p:sp>
        <p:nvSpPr><p:cNvPr id="3" name="Subtitle 2"/><p:cNvSpPr/><p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr></p:nvSpPr>
        <p:spPr/>
        <p:txBody><a:bodyPr/><a:p><a:r><a:t>By Ada</a:t></a:r></a:p></p:txBody>
      </p:sp>
      <p:sp>
        <p:nvSpPr><p:cNvPr id="4" name="TextBox 3"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
        <p:spPr/>
        <p:txBody><a:bodyPr/><a:p><a:pPr lvl="1"/><a:r><a:rPr sz="1800" b="1"/><a:t> spaced </a:t></a:r></a:p><a:p/></p:txBody>
      </p:sp>
    </p:spTree>
  </p:cSld>
</p:sld>"#;

    #[test]
    fn test_parse_slide_text_roles() {
        let paras = parse_slide_text(SLIDE).unwrap();
        assert_eq!(paras.len(), 3);

        assert_eq!(paras[0].role, TextRole::Title);
        assert_eq!(paras[0].plain_text(), "Rust & You");
        assert_eq!(paras[0].alignment, TextAlignment::Center);

        assert_eq!(paras[1].role, TextRole::Subtitle);
        assert_eq!(paras[1].plain_text(), "By Ada");
    }

    #[test]
    fn test_parse_slide_text_run_properties() {
        let paras = parse_slide_text(SLIDE).unwrap();
        let body = &paras[2];
        assert_eq!(body.role, TextRole::Body);
        assert_eq!(body.plain_text(), " spaced ");
        assert_eq!(body.level, 1);
        assert_eq!(body.font_size(), Some(1800));
        assert!(body.runs[0].style.bold);
    }

    #[test]
    fn test_parse_presentation_slide_ids() {
        let xml = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst><p:sldId id="256" r:id="rId7"/><p:sldId id="300" r:id="rId9"/></p:sldIdLst>
</p:presentation>"#;
        let slides = parse_presentation_xml(xml).unwrap().slides;
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].id, 256);
        assert_eq!(slides[1].rel_id, "rId9");
    }

    #[test]
    fn test_malformed_slide_is_an_error() {
        let result = parse_slide_text("<p:sld><p:cSld></p:sld>");
        assert!(matches!(result, Err(Error::XmlParse(_))));
    }
}
