//! Deck assembly: a title slide followed by content slides, built on a
//! template.
//!
//! Each step consumes the [`Deck`] and returns the next one, so a deck value
//! always reflects a completed sequence of steps.

use super::resolve::{resolve, PlaceholderRole};
use super::synth::synthesize;
use crate::error::{Error, Result};
use crate::model::TextAlignment;
use crate::package::Package;
use crate::pptx::{
    build_package, write_deck, Rect, Slide, Template, TextFrame, TextParagraph, CONTENT_LAYOUT,
    TITLE_LAYOUT,
};
use log::{debug, warn};

/// Fallback box for the author line when the title layout has no subtitle.
pub const SUBTITLE_BOX: Rect = Rect::from_points(50, 300, 600, 50);
/// Fallback box for slide content when the content layout has no body.
pub const CONTENT_BOX: Rect = Rect::from_points(50, 150, 600, 300);

const SUBTITLE_FALLBACK_PT: u32 = 24;
const CONTENT_PT: u32 = 18;

/// The last completed assembly step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TemplateLoaded,
    TitleSlideBuilt,
    /// Number of content slides built so far.
    ContentSlideBuilt(usize),
}

/// Everything the assembler needs from a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckRequest {
    pub title: String,
    pub author: String,
    pub topic: String,
    /// Total slides requested, title slide included.
    pub num_slides: i64,
}

impl DeckRequest {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        topic: impl Into<String>,
        num_slides: i64,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            topic: topic.into(),
            num_slides,
        }
    }

    /// Build a request from raw form fields.
    ///
    /// The topic is the first non-blank line of `content`, trimmed, or the
    /// title when there is none.
    pub fn from_form(title: &str, author: &str, content: &str, num_slides: i64) -> Self {
        let topic = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(title);
        Self::new(title, author, topic, num_slides)
    }

    /// Number of slides after the title slide.
    pub fn content_slide_count(&self) -> usize {
        usize::try_from(self.num_slides.saturating_sub(1)).unwrap_or(0)
    }
}

/// A deck under construction on top of a template.
///
/// The template's own slides are never carried over; only the slides added
/// here end up in the output.
#[derive(Debug, Clone)]
pub struct Deck<'t> {
    template: &'t Template,
    slides: Vec<Slide>,
    stage: Stage,
}

impl<'t> Deck<'t> {
    pub fn new(template: &'t Template) -> Self {
        debug!(
            "deck: template loaded ({} layouts, {} existing slides dropped)",
            template.layouts().len(),
            template.slides().len()
        );
        Self {
            template,
            slides: Vec::new(),
            stage: Stage::TemplateLoaded,
        }
    }

    pub fn template(&self) -> &Template {
        self.template
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Add the title slide: centered title, "By {author}" below it.
    pub fn with_title_slide(mut self, title: &str, author: &str) -> Result<Self> {
        if self.stage != Stage::TemplateLoaded {
            return Err(Error::Assembly("title slide already built".to_string()));
        }

        let layout = self.template.layout(TITLE_LAYOUT)?;
        let slide = Slide::from_layout(TITLE_LAYOUT, layout)
            .with_title(TextParagraph::new(title).aligned(TextAlignment::Center))?;

        let byline = TextParagraph::new(format!("By {}", author)).aligned(TextAlignment::Center);
        let subtitle = resolve(&slide, PlaceholderRole::Subtitle).map(|p| p.shape_id);
        let slide = match subtitle {
            Some(shape_id) => slide.with_placeholder_text(shape_id, TextFrame::single(byline))?,
            None => {
                warn!(
                    "layout '{}' has no subtitle placeholder, using a text box",
                    layout.name
                );
                slide.with_text_box(
                    SUBTITLE_BOX,
                    TextFrame::single(byline.sized(SUBTITLE_FALLBACK_PT)),
                )
            }
        };

        debug!("deck: title slide built");
        self.slides.push(slide);
        self.stage = Stage::TitleSlideBuilt;
        Ok(self)
    }

    /// Add the next content slide, titled "Slide {n}" and holding `content`.
    pub fn with_content_slide(mut self, content: &str) -> Result<Self> {
        let number = match self.stage {
            Stage::TemplateLoaded => {
                return Err(Error::Assembly(
                    "content slide added before the title slide".to_string(),
                ))
            }
            Stage::TitleSlideBuilt => 1,
            Stage::ContentSlideBuilt(n) => n + 1,
        };

        let layout = self.template.layout(CONTENT_LAYOUT)?;
        let slide = Slide::from_layout(CONTENT_LAYOUT, layout).with_title(
            TextParagraph::new(format!("Slide {}", number)).aligned(TextAlignment::Left),
        )?;

        let body = TextFrame::single(
            TextParagraph::new(content)
                .aligned(TextAlignment::Left)
                .sized(CONTENT_PT),
        );
        let target = resolve(&slide, PlaceholderRole::Content).map(|p| p.shape_id);
        let slide = match target {
            Some(shape_id) => slide.with_placeholder_text(shape_id, body)?,
            None => {
                warn!(
                    "layout '{}' has no content placeholder, using a text box",
                    layout.name
                );
                slide.with_text_box(CONTENT_BOX, body)
            }
        };

        debug!("deck: content slide {} built", number);
        self.slides.push(slide);
        self.stage = Stage::ContentSlideBuilt(number);
        Ok(self)
    }

    /// The output package with the template's slides replaced.
    pub fn to_package(&self) -> Result<Package> {
        self.check_complete()?;
        build_package(self.template, &self.slides)
    }

    /// Serialize the deck as `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.check_complete()?;
        write_deck(self.template, &self.slides)
    }

    fn check_complete(&self) -> Result<()> {
        if self.stage == Stage::TemplateLoaded {
            return Err(Error::Assembly("deck has no title slide".to_string()));
        }
        Ok(())
    }
}

/// Build the full deck for `request`: one title slide plus
/// `num_slides - 1` content slides.
pub fn assemble<'t>(template: &'t Template, request: &DeckRequest) -> Result<Deck<'t>> {
    let count = request.content_slide_count();
    let points = synthesize(&request.topic, count);

    let deck = Deck::new(template).with_title_slide(&request.title, &request.author)?;
    let deck = points
        .iter()
        .try_fold(deck, |deck, point| deck.with_content_slide(point))?;

    debug!("deck: assembled {} slides for '{}'", deck.len(), request.title);
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::frame::{frame_package, frame_template, Palette};
    use crate::pptx::{PlaceholderKind, Shape};

    const PALETTE: Palette = Palette {
        name: "test",
        background: "FFFFFF",
        text: "000000",
    };

    fn template() -> Template {
        frame_template(&PALETTE).unwrap()
    }

    #[test]
    fn test_from_form_topic() {
        let req = DeckRequest::from_form("Deck", "Ann", "\n  \n  Rust ownership \nmore", 3);
        assert_eq!(req.topic, "Rust ownership");

        let req = DeckRequest::from_form("Deck", "Ann", "   \n", 3);
        assert_eq!(req.topic, "Deck");
    }

    #[test]
    fn test_content_slide_count() {
        assert_eq!(DeckRequest::new("t", "a", "x", 5).content_slide_count(), 4);
        assert_eq!(DeckRequest::new("t", "a", "x", 1).content_slide_count(), 0);
        assert_eq!(DeckRequest::new("t", "a", "x", 0).content_slide_count(), 0);
        assert_eq!(DeckRequest::new("t", "a", "x", -3).content_slide_count(), 0);
        assert_eq!(
            DeckRequest::new("t", "a", "x", i64::MIN).content_slide_count(),
            0
        );
    }

    #[test]
    fn test_assemble_slide_count() {
        let template = template();
        for n in [1, 2, 6] {
            let deck = assemble(&template, &DeckRequest::new("T", "A", "Python", n)).unwrap();
            assert_eq!(deck.len(), n as usize);
        }
        let deck = assemble(&template, &DeckRequest::new("T", "A", "Python", 0)).unwrap();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.stage(), Stage::TitleSlideBuilt);
    }

    #[test]
    fn test_title_slide_uses_subtitle_placeholder() {
        let template = template();
        let deck = assemble(&template, &DeckRequest::new("My Deck", "Ann", "x", 1)).unwrap();
        let slide = &deck.slides()[0];

        let title = slide.title().unwrap();
        assert_eq!(title.text.plain_text(), "My Deck");
        assert_eq!(
            title.text.paragraphs[0].alignment,
            Some(TextAlignment::Center)
        );

        let subtitle = slide
            .placeholders()
            .find(|p| p.kind == PlaceholderKind::Subtitle)
            .unwrap();
        assert_eq!(subtitle.text.plain_text(), "By Ann");
        assert_eq!(subtitle.text.paragraphs[0].font_size, None);
        assert_eq!(slide.text_boxes().count(), 0);
    }

    #[test]
    fn test_content_slides() {
        let template = template();
        let deck = assemble(&template, &DeckRequest::new("T", "A", "Gardening", 4)).unwrap();
        assert_eq!(deck.stage(), Stage::ContentSlideBuilt(3));

        for (i, slide) in deck.slides()[1..].iter().enumerate() {
            assert_eq!(slide.layout_index, CONTENT_LAYOUT);
            let title = slide.title().unwrap();
            assert_eq!(title.text.plain_text(), format!("Slide {}", i + 1));
            assert_eq!(title.text.paragraphs[0].alignment, Some(TextAlignment::Left));

            let body = resolve(slide, PlaceholderRole::Content).unwrap();
            assert_eq!(body.text.paragraphs.len(), 1);
            let para = &body.text.paragraphs[0];
            assert_eq!(para.text, "Overview of Gardening.");
            assert_eq!(para.font_size, Some(18));
            assert_eq!(para.alignment, Some(TextAlignment::Left));
            assert_eq!(para.level, 0);
        }
    }

    const TITLE_ONLY_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld name="Title Only"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sldLayout>"#;

    /// A frame whose two layouts carry nothing but a title.
    fn bare_template() -> Template {
        let mut package = frame_package(&PALETTE);
        package.set_part("ppt/slideLayouts/slideLayout1.xml", TITLE_ONLY_LAYOUT);
        package.set_part("ppt/slideLayouts/slideLayout2.xml", TITLE_ONLY_LAYOUT);
        Template::from_package(package).unwrap()
    }

    #[test]
    fn test_fallback_text_boxes() {
        let template = bare_template();
        let deck = assemble(&template, &DeckRequest::new("T", "Ann", "Gardening", 2)).unwrap();

        let title_slide = &deck.slides()[0];
        let boxes: Vec<_> = title_slide.text_boxes().collect();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].rect, SUBTITLE_BOX);
        let para = &boxes[0].text.paragraphs[0];
        assert_eq!(para.text, "By Ann");
        assert_eq!(para.font_size, Some(24));
        assert_eq!(para.alignment, Some(TextAlignment::Center));

        let content_slide = &deck.slides()[1];
        let boxes: Vec<_> = content_slide.text_boxes().collect();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].rect, CONTENT_BOX);
        assert_eq!(boxes[0].text.paragraphs[0].font_size, Some(18));
        assert_eq!(boxes[0].text.paragraphs[0].alignment, Some(TextAlignment::Left));
        assert!(matches!(content_slide.shapes().last(), Some(Shape::TextBox(_))));
    }

    #[test]
    fn test_content_before_title_is_rejected() {
        let template = template();
        let err = Deck::new(&template).with_content_slide("x").unwrap_err();
        assert!(matches!(err, Error::Assembly(_)));
    }

    #[test]
    fn test_second_title_slide_is_rejected() {
        let template = template();
        let deck = Deck::new(&template).with_title_slide("T", "A").unwrap();
        assert!(matches!(
            deck.with_title_slide("T", "A"),
            Err(Error::Assembly(_))
        ));
    }

    #[test]
    fn test_empty_deck_cannot_be_written() {
        let template = template();
        assert!(matches!(
            Deck::new(&template).to_bytes(),
            Err(Error::Assembly(_))
        ));
    }

    #[test]
    fn test_steps_do_not_touch_earlier_values() {
        let template = template();
        let titled = Deck::new(&template).with_title_slide("T", "A").unwrap();
        let extended = titled.clone().with_content_slide("one").unwrap();
        assert_eq!(titled.len(), 1);
        assert_eq!(extended.len(), 2);
    }
}
