//! Slides under construction and their XML serialization.

use super::layout::{Layout, PlaceholderKind};
use crate::container::escape_xml;
use crate::error::{Error, Result};
use crate::model::TextAlignment;
use std::fmt::Write as FmtWrite;

/// English Metric Units per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Convert points to EMU.
pub const fn pt(points: i64) -> i64 {
    points * EMU_PER_POINT
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    /// Build a rectangle from point measurements.
    pub const fn from_points(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x: pt(x),
            y: pt(y),
            cx: pt(width),
            cy: pt(height),
        }
    }
}

/// One paragraph of text with optional direct formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextParagraph {
    pub text: String,
    pub alignment: Option<TextAlignment>,
    /// Font size in whole points.
    pub font_size: Option<u32>,
    pub level: u8,
}

impl TextParagraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alignment: None,
            font_size: None,
            level: 0,
        }
    }

    pub fn aligned(mut self, alignment: TextAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn sized(mut self, points: u32) -> Self {
        self.font_size = Some(points);
        self
    }

    fn write_xml(&self, xml: &mut String) {
        xml.push_str("<a:p>");
        if self.alignment.is_some() || self.level > 0 {
            xml.push_str("<a:pPr");
            if self.level > 0 {
                let _ = write!(xml, r#" lvl="{}""#, self.level);
            }
            if let Some(alignment) = self.alignment {
                let _ = write!(xml, r#" algn="{}""#, alignment.as_drawingml());
            }
            xml.push_str("/>");
        }

        let mut rpr = String::from(r#"<a:rPr lang="en-US""#);
        if let Some(size) = self.font_size {
            let _ = write!(rpr, r#" sz="{}""#, size * 100);
        }
        rpr.push_str(r#" dirty="0"/>"#);

        let text: String = self
            .text
            .chars()
            .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
            .collect();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<a:br>");
                xml.push_str(&rpr);
                xml.push_str("</a:br>");
            }
            if !line.is_empty() {
                xml.push_str("<a:r>");
                xml.push_str(&rpr);
                let _ = write!(xml, "<a:t>{}</a:t>", escape_xml(line));
                xml.push_str("</a:r>");
            }
        }
        xml.push_str("</a:p>");
    }
}

/// The text body of a shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFrame {
    pub paragraphs: Vec<TextParagraph>,
}

impl TextFrame {
    /// A frame holding exactly one paragraph.
    pub fn single(paragraph: TextParagraph) -> Self {
        Self {
            paragraphs: vec![paragraph],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_xml(&self, xml: &mut String) {
        if self.paragraphs.is_empty() {
            // a:txBody needs at least one paragraph
            xml.push_str("<a:p/>");
        }
        for para in &self.paragraphs {
            para.write_xml(xml);
        }
    }
}

/// A placeholder shape inherited from the slide's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub shape_id: u32,
    pub name: String,
    pub kind: PlaceholderKind,
    pub idx: u32,
    pub text: TextFrame,
}

/// A free-standing text box with explicit geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub shape_id: u32,
    pub name: String,
    pub rect: Rect,
    pub text: TextFrame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Placeholder(Placeholder),
    TextBox(TextBox),
}

impl Shape {
    pub fn shape_id(&self) -> u32 {
        match self {
            Shape::Placeholder(p) => p.shape_id,
            Shape::TextBox(t) => t.shape_id,
        }
    }

    pub fn text(&self) -> &TextFrame {
        match self {
            Shape::Placeholder(p) => &p.text,
            Shape::TextBox(t) => &t.text,
        }
    }
}

/// A slide being built: the layout it is based on plus its shapes.
///
/// Every edit consumes the slide and returns the edited value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub layout_index: usize,
    pub layout_name: String,
    shapes: Vec<Shape>,
}

fn placeholder_base_name(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Title | PlaceholderKind::CenterTitle => "Title",
        PlaceholderKind::VerticalTitle => "Vertical Title",
        PlaceholderKind::Subtitle => "Subtitle",
        PlaceholderKind::Body => "Text Placeholder",
        PlaceholderKind::Text => "Content Placeholder",
        PlaceholderKind::Date => "Date Placeholder",
        PlaceholderKind::Footer => "Footer Placeholder",
        PlaceholderKind::SlideNumber => "Slide Number Placeholder",
        PlaceholderKind::Header => "Header Placeholder",
        PlaceholderKind::Chart => "Chart Placeholder",
        PlaceholderKind::Table => "Table Placeholder",
        PlaceholderKind::ClipArt => "ClipArt Placeholder",
        PlaceholderKind::Diagram => "SmartArt Placeholder",
        PlaceholderKind::Media => "Media Placeholder",
        PlaceholderKind::SlideImage => "Slide Image Placeholder",
        PlaceholderKind::Picture => "Picture Placeholder",
    }
}

impl Slide {
    /// Start a slide from a layout, cloning its placeholders (except date,
    /// footer and slide number) with empty text.
    pub fn from_layout(layout_index: usize, layout: &Layout) -> Self {
        let shapes = layout
            .slide_placeholders()
            .zip(2u32..)
            .map(|(ph, shape_id)| {
                Shape::Placeholder(Placeholder {
                    shape_id,
                    name: format!("{} {}", placeholder_base_name(ph.kind), shape_id - 1),
                    kind: ph.kind,
                    idx: ph.idx,
                    text: TextFrame::default(),
                })
            })
            .collect();

        Self {
            layout_index,
            layout_name: layout.name.clone(),
            shapes,
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Placeholder(p) => Some(p),
            Shape::TextBox(_) => None,
        })
    }

    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBox> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::TextBox(t) => Some(t),
            Shape::Placeholder(_) => None,
        })
    }

    /// The title shape: the first title-family placeholder.
    pub fn title(&self) -> Option<&Placeholder> {
        self.placeholders().find(|p| p.kind.is_title())
    }

    /// Set the title text.
    pub fn with_title(self, paragraph: TextParagraph) -> Result<Self> {
        let shape_id = self
            .title()
            .map(|p| p.shape_id)
            .ok_or_else(|| Error::MissingTitle(self.layout_name.clone()))?;
        self.with_placeholder_text(shape_id, TextFrame::single(paragraph))
    }

    /// Replace the whole text of a placeholder.
    pub fn with_placeholder_text(mut self, shape_id: u32, text: TextFrame) -> Result<Self> {
        let placeholder = self
            .shapes
            .iter_mut()
            .find_map(|s| match s {
                Shape::Placeholder(p) if p.shape_id == shape_id => Some(p),
                _ => None,
            })
            .ok_or_else(|| {
                Error::InvalidData(format!("slide has no placeholder with id {}", shape_id))
            })?;
        placeholder.text = text;
        Ok(self)
    }

    /// Append a text box on top of the existing shapes.
    pub fn with_text_box(mut self, rect: Rect, text: TextFrame) -> Self {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::TextBox(TextBox {
            shape_id,
            name: format!("TextBox {}", shape_id - 1),
            rect,
            text,
        }));
        self
    }

    fn next_shape_id(&self) -> u32 {
        // id 1 is the group shape of the tree
        self.shapes.iter().map(Shape::shape_id).max().unwrap_or(1) + 1
    }

    /// Serialize to a `p:sld` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024 + self.shapes.len() * 512);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
        );
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        );
        xml.push_str(r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);

        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str("<p:grpSpPr><a:xfrm>");
        xml.push_str(r#"<a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#);
        xml.push_str(r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/>"#);
        xml.push_str("</a:xfrm></p:grpSpPr>");

        for shape in &self.shapes {
            match shape {
                Shape::Placeholder(p) => write_placeholder(&mut xml, p),
                Shape::TextBox(t) => write_text_box(&mut xml, t),
            }
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        xml
    }
}

fn write_placeholder(xml: &mut String, p: &Placeholder) {
    xml.push_str("<p:sp><p:nvSpPr>");
    let _ = write!(
        xml,
        r#"<p:cNvPr id="{}" name="{}"/>"#,
        p.shape_id,
        escape_xml(&p.name)
    );
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str("<p:nvPr><p:ph");
    if p.kind != PlaceholderKind::Text {
        let _ = write!(xml, r#" type="{}""#, p.kind.as_schema());
    }
    if p.idx != 0 {
        let _ = write!(xml, r#" idx="{}""#, p.idx);
    }
    xml.push_str("/></p:nvPr></p:nvSpPr>");
    xml.push_str("<p:spPr/>");
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    p.text.write_xml(xml);
    xml.push_str("</p:txBody></p:sp>");
}

fn write_text_box(xml: &mut String, t: &TextBox) {
    xml.push_str("<p:sp><p:nvSpPr>");
    let _ = write!(
        xml,
        r#"<p:cNvPr id="{}" name="{}"/>"#,
        t.shape_id,
        escape_xml(&t.name)
    );
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
    xml.push_str("<p:spPr><a:xfrm>");
    let _ = write!(xml, r#"<a:off x="{}" y="{}"/>"#, t.rect.x, t.rect.y);
    let _ = write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, t.rect.cx, t.rect.cy);
    xml.push_str("</a:xfrm>");
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
    xml.push_str("</p:spPr>");
    xml.push_str(r#"<p:txBody><a:bodyPr wrap="none"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#);
    t.text.write_xml(xml);
    xml.push_str("</p:txBody></p:sp>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRole;
    use crate::pptx::layout::LayoutPlaceholder;
    use crate::pptx::parser::parse_slide_text;

    fn layout(placeholders: &[(PlaceholderKind, u32)]) -> Layout {
        Layout {
            name: "Test Layout".to_string(),
            part_name: "ppt/slideLayouts/slideLayout1.xml".to_string(),
            placeholders: placeholders
                .iter()
                .map(|(kind, idx)| LayoutPlaceholder {
                    kind: *kind,
                    idx: *idx,
                    name: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_points_to_emu() {
        assert_eq!(pt(1), 12_700);
        let rect = Rect::from_points(50, 300, 600, 50);
        assert_eq!(rect.x, 635_000);
        assert_eq!(rect.cy, 635_000);
    }

    #[test]
    fn test_from_layout_skips_slide_metadata() {
        let layout = layout(&[
            (PlaceholderKind::Title, 0),
            (PlaceholderKind::Text, 1),
            (PlaceholderKind::Date, 10),
            (PlaceholderKind::SlideNumber, 12),
        ]);
        let slide = Slide::from_layout(1, &layout);

        let ids: Vec<u32> = slide.shapes().iter().map(Shape::shape_id).collect();
        assert_eq!(ids, [2, 3]);
        assert_eq!(slide.placeholders().nth(1).unwrap().name, "Content Placeholder 2");
        assert_eq!(slide.title().unwrap().shape_id, 2);
    }

    #[test]
    fn test_with_title_requires_title_placeholder() {
        let slide = Slide::from_layout(0, &layout(&[(PlaceholderKind::Body, 1)]));
        let result = slide.with_title(TextParagraph::new("Hello"));
        assert!(matches!(result, Err(Error::MissingTitle(name)) if name == "Test Layout"));
    }

    #[test]
    fn test_text_box_gets_next_id() {
        let slide = Slide::from_layout(0, &layout(&[(PlaceholderKind::CenterTitle, 0)]))
            .with_text_box(Rect::from_points(50, 150, 600, 300), TextFrame::default());
        let text_box = slide.text_boxes().next().unwrap();
        assert_eq!(text_box.shape_id, 3);
        assert_eq!(text_box.name, "TextBox 2");
    }

    #[test]
    fn test_to_xml_reads_back() {
        let slide = Slide::from_layout(
            0,
            &layout(&[(PlaceholderKind::CenterTitle, 0), (PlaceholderKind::Subtitle, 1)]),
        )
        .with_title(TextParagraph::new("Fish & <Chips>").aligned(TextAlignment::Center))
        .unwrap()
        .with_placeholder_text(
            3,
            TextFrame::single(TextParagraph::new("By Ada").aligned(TextAlignment::Center).sized(24)),
        )
        .unwrap();

        let xml = slide.to_xml();
        assert!(xml.contains(r#"<p:ph type="ctrTitle"/>"#));
        assert!(xml.contains(r#"<p:ph type="subTitle" idx="1"/>"#));
        assert!(xml.contains(r#"sz="2400""#));

        let paras = parse_slide_text(&xml).unwrap();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].plain_text(), "Fish & <Chips>");
        assert_eq!(paras[0].role, TextRole::Title);
        assert_eq!(paras[1].role, TextRole::Subtitle);
        assert_eq!(paras[1].alignment, TextAlignment::Center);
    }

    #[test]
    fn test_control_characters_are_dropped_and_newlines_break() {
        let mut xml = String::new();
        TextParagraph::new("a\u{1}b\nc").write_xml(&mut xml);
        assert!(!xml.contains('\u{1}'));
        assert!(xml.contains("<a:t>ab</a:t>"));
        assert!(xml.contains("<a:br>"));
        assert!(xml.contains("<a:t>c</a:t>"));
    }

    #[test]
    fn test_empty_frame_still_has_a_paragraph() {
        let mut xml = String::new();
        TextFrame::default().write_xml(&mut xml);
        assert_eq!(xml, "<a:p/>");
    }
}
