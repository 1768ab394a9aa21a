//! Slide layouts and the placeholder types they declare.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

/// Placeholder type, as declared by the `type` attribute of `p:ph`
/// (`ST_PlaceholderType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderKind {
    /// `title`
    Title,
    /// `ctrTitle`, the centered title of a title slide
    CenterTitle,
    /// `vertTitle`
    VerticalTitle,
    /// `subTitle`
    Subtitle,
    /// `body`
    Body,
    /// `obj`, the generic content placeholder. This is also the schema
    /// default when `type` is omitted.
    Text,
    /// `dt`
    Date,
    /// `ftr`
    Footer,
    /// `sldNum`
    SlideNumber,
    /// `hdr`
    Header,
    /// `chart`
    Chart,
    /// `tbl`
    Table,
    /// `clipArt`
    ClipArt,
    /// `dgm`
    Diagram,
    /// `media`
    Media,
    /// `sldImg`
    SlideImage,
    /// `pic`
    Picture,
}

impl PlaceholderKind {
    /// Map an `ST_PlaceholderType` value. Unknown values are treated as the
    /// generic content kind.
    pub fn from_schema(value: &str) -> Self {
        match value {
            "title" => PlaceholderKind::Title,
            "ctrTitle" => PlaceholderKind::CenterTitle,
            "vertTitle" => PlaceholderKind::VerticalTitle,
            "subTitle" => PlaceholderKind::Subtitle,
            "body" => PlaceholderKind::Body,
            "dt" => PlaceholderKind::Date,
            "ftr" => PlaceholderKind::Footer,
            "sldNum" => PlaceholderKind::SlideNumber,
            "hdr" => PlaceholderKind::Header,
            "chart" => PlaceholderKind::Chart,
            "tbl" => PlaceholderKind::Table,
            "clipArt" => PlaceholderKind::ClipArt,
            "dgm" => PlaceholderKind::Diagram,
            "media" => PlaceholderKind::Media,
            "sldImg" => PlaceholderKind::SlideImage,
            "pic" => PlaceholderKind::Picture,
            _ => PlaceholderKind::Text,
        }
    }

    /// The `ST_PlaceholderType` value written back to slide XML.
    pub fn as_schema(&self) -> &'static str {
        match self {
            PlaceholderKind::Title => "title",
            PlaceholderKind::CenterTitle => "ctrTitle",
            PlaceholderKind::VerticalTitle => "vertTitle",
            PlaceholderKind::Subtitle => "subTitle",
            PlaceholderKind::Body => "body",
            PlaceholderKind::Text => "obj",
            PlaceholderKind::Date => "dt",
            PlaceholderKind::Footer => "ftr",
            PlaceholderKind::SlideNumber => "sldNum",
            PlaceholderKind::Header => "hdr",
            PlaceholderKind::Chart => "chart",
            PlaceholderKind::Table => "tbl",
            PlaceholderKind::ClipArt => "clipArt",
            PlaceholderKind::Diagram => "dgm",
            PlaceholderKind::Media => "media",
            PlaceholderKind::SlideImage => "sldImg",
            PlaceholderKind::Picture => "pic",
        }
    }

    /// Title family: `title`, `ctrTitle` and `vertTitle`.
    pub fn is_title(&self) -> bool {
        matches!(
            self,
            PlaceholderKind::Title | PlaceholderKind::CenterTitle | PlaceholderKind::VerticalTitle
        )
    }

    /// Date, footer and slide-number placeholders. New slides do not get
    /// copies of these.
    pub fn is_slide_metadata(&self) -> bool {
        matches!(
            self,
            PlaceholderKind::Date | PlaceholderKind::Footer | PlaceholderKind::SlideNumber
        )
    }
}

impl std::fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_schema())
    }
}

/// A placeholder declared on a slide layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutPlaceholder {
    pub kind: PlaceholderKind,
    /// `idx` attribute; 0 when absent.
    pub idx: u32,
    /// Shape name from `p:cNvPr`.
    pub name: String,
}

/// A slide layout part and its placeholders in shape order.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Display name from `p:cSld/@name`.
    pub name: String,
    /// Part name inside the package, e.g. `ppt/slideLayouts/slideLayout1.xml`.
    pub part_name: String,
    pub placeholders: Vec<LayoutPlaceholder>,
}

impl Layout {
    /// Parse a `p:sldLayout` part.
    pub fn parse(part_name: impl Into<String>, xml: &str) -> Result<Self> {
        let mut layout = Layout {
            name: String::new(),
            part_name: part_name.into(),
            placeholders: Vec::new(),
        };

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut shape_depth = 0usize;
        let mut current_name = String::new();
        let mut current_ph: Option<(PlaceholderKind, u32)> = None;
        let mut saw_root = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().local_name().as_ref() {
                    b"sldLayout" => saw_root = true,
                    b"cSld" => layout.name = attribute(e, b"name").unwrap_or_default(),
                    b"sp" => {
                        shape_depth += 1;
                        current_name.clear();
                        current_ph = None;
                    }
                    b"cNvPr" if shape_depth > 0 => {
                        current_name = attribute(e, b"name").unwrap_or_default();
                    }
                    b"ph" if shape_depth > 0 => current_ph = Some(placeholder_attributes(e)),
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.name().local_name().as_ref() {
                    b"sldLayout" => saw_root = true,
                    b"cSld" => layout.name = attribute(e, b"name").unwrap_or_default(),
                    b"cNvPr" if shape_depth > 0 => {
                        current_name = attribute(e, b"name").unwrap_or_default();
                    }
                    b"ph" if shape_depth > 0 => current_ph = Some(placeholder_attributes(e)),
                    _ => {}
                },
                Ok(Event::End(ref e)) if e.name().local_name().as_ref() == b"sp" => {
                    shape_depth = shape_depth.saturating_sub(1);
                    if let Some((kind, idx)) = current_ph.take() {
                        layout.placeholders.push(LayoutPlaceholder {
                            kind,
                            idx,
                            name: std::mem::take(&mut current_name),
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(Error::InvalidData(format!(
                "{} is not a slide layout",
                layout.part_name
            )));
        }

        Ok(layout)
    }

    /// The placeholder that receives the slide title.
    pub fn title_placeholder(&self) -> Option<&LayoutPlaceholder> {
        self.placeholders.iter().find(|p| p.kind.is_title())
    }

    /// Placeholders a new slide based on this layout starts with.
    pub fn slide_placeholders(&self) -> impl Iterator<Item = &LayoutPlaceholder> {
        self.placeholders
            .iter()
            .filter(|p| !p.kind.is_slide_metadata())
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| {
            a.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned())
        })
}

fn placeholder_attributes(e: &BytesStart<'_>) -> (PlaceholderKind, u32) {
    let kind = attribute(e, b"type")
        .map(|t| PlaceholderKind::from_schema(&t))
        .unwrap_or(PlaceholderKind::Text);
    let idx = attribute(e, b"idx")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    (kind, idx)
}
