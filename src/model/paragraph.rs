//! Slide paragraphs as read back from DrawingML.

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a paragraph (`a:pPr/@algn`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlignment {
    pub fn as_drawingml(&self) -> &'static str {
        match self {
            TextAlignment::Left => "l",
            TextAlignment::Center => "ctr",
            TextAlignment::Right => "r",
            TextAlignment::Justify => "just",
        }
    }

    /// `dist` is folded into `Justify`; unknown codes give `None`.
    pub fn from_drawingml(value: &str) -> Option<Self> {
        Some(match value {
            "l" => TextAlignment::Left,
            "ctr" => TextAlignment::Center,
            "r" => TextAlignment::Right,
            "just" | "dist" => TextAlignment::Justify,
            _ => return None,
        })
    }
}

/// What a paragraph is on its slide, derived from the placeholder holding it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRole {
    /// Any text outside a title or subtitle placeholder, text boxes included.
    #[default]
    Body,
    Title,
    Subtitle,
}

impl TextRole {
    /// Role for a `p:ph/@type` value.
    pub fn from_placeholder_type(value: &str) -> Self {
        match value {
            "title" | "ctrTitle" | "vertTitle" => TextRole::Title,
            "subTitle" => TextRole::Subtitle,
            _ => TextRole::Body,
        }
    }

    pub fn is_body(&self) -> bool {
        *self == TextRole::Body
    }
}

/// Direct run formatting (`a:rPr`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    /// `sz` in hundredths of a point, so 18pt is 1800.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl TextStyle {
    pub fn size_pt(&self) -> Option<u32> {
        self.size.map(|s| s / 100)
    }

    fn is_plain(&self) -> bool {
        *self == TextStyle::default()
    }
}

/// Text sharing one set of run properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "TextStyle::is_plain")]
    pub style: TextStyle,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, TextStyle::default())
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One `a:p` element of a slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default, skip_serializing_if = "TextRole::is_body")]
    pub role: TextRole,
    #[serde(default)]
    pub alignment: TextAlignment,
    /// Outline level from `a:pPr/@lvl`.
    #[serde(default)]
    pub level: u8,
}

impl Paragraph {
    pub fn new(role: TextRole) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    /// A single unstyled run.
    pub fn with_text(role: TextRole, text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::plain(text)],
            role,
            ..Default::default()
        }
    }

    pub fn add_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// True when no run carries any text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Size of the first run that sets one, in hundredths of a point.
    pub fn font_size(&self) -> Option<u32> {
        self.runs.iter().find_map(|r| r.style.size)
    }
}
