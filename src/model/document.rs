//! A presentation read back into slides and paragraphs.

use super::{Paragraph, TextRole};
use serde::{Deserialize, Serialize};

/// Core properties (`docProps/core.xml`) plus the slide count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `dc:creator`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// W3CDTF timestamps as stored in the package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<u32>,
}

/// One slide: its position and the non-empty paragraphs of its shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// 0-based position in `sldIdLst`.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn with_name(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn add_paragraph(&mut self, para: Paragraph) {
        self.paragraphs.push(para);
    }

    /// Text of the first paragraph with `role`.
    pub fn text_of(&self, role: TextRole) -> Option<String> {
        self.paragraphs
            .iter()
            .find(|p| p.role == role)
            .map(Paragraph::plain_text)
    }

    pub fn title(&self) -> Option<String> {
        self.text_of(TextRole::Title)
    }

    pub fn subtitle(&self) -> Option<String> {
        self.text_of(TextRole::Subtitle)
    }

    pub fn body(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs.iter().filter(|p| p.role.is_body())
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }
}

/// A parsed deck, one [`Section`] per slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Metadata,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// True when no slide carries any text.
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(Section::is_empty)
    }

    /// All text, one line per paragraph and a blank line between slides.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.paragraphs
                    .iter()
                    .map(Paragraph::plain_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(index: usize, paragraphs: &[(TextRole, &str)]) -> Section {
        let mut section = Section::with_name(index, format!("Slide {}", index + 1));
        for (role, text) in paragraphs {
            section.add_paragraph(Paragraph::with_text(*role, *text));
        }
        section
    }

    #[test]
    fn test_section_roles() {
        let section = slide(
            0,
            &[
                (TextRole::Title, "Deck"),
                (TextRole::Subtitle, "By Ada"),
                (TextRole::Body, "Body"),
            ],
        );

        assert_eq!(section.title().as_deref(), Some("Deck"));
        assert_eq!(section.subtitle().as_deref(), Some("By Ada"));
        assert_eq!(section.body().count(), 1);
        assert_eq!(section.len(), 3);
    }

    #[test]
    fn test_missing_title() {
        let section = slide(0, &[(TextRole::Body, "only body")]);
        assert_eq!(section.title(), None);
    }

    #[test]
    fn test_plain_text_skips_empty_slides() {
        let mut doc = Document::new();
        assert!(doc.is_empty());

        doc.add_section(slide(0, &[(TextRole::Title, "One"), (TextRole::Body, "a")]));
        doc.add_section(Section::new(1));
        doc.add_section(slide(2, &[(TextRole::Title, "Two")]));

        assert!(!doc.is_empty());
        assert_eq!(doc.plain_text(), "One\na\n\nTwo");
    }

    #[test]
    fn test_json_round_trip() {
        let mut doc = Document::new();
        doc.metadata.title = Some("Deck".to_string());
        doc.metadata.slide_count = Some(1);
        doc.add_section(slide(0, &[(TextRole::Title, "Deck")]));

        let json = doc.to_json().unwrap();
        assert!(!json.contains("subject"));
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
