//! End-to-end deck generation against the built-in frames.
//!
//! Every deck is serialized and read back with the presentation reader, so
//! these tests check what a viewer would see rather than the in-memory
//! slide values.

use slidegen::deck::{CONTENT_BOX, PYTHON_POINTS, SUBTITLE_BOX};
use slidegen::package::{content_type, Package};
use slidegen::pptx::frame::frame_package;
use slidegen::pptx::{PptxParser, Template};
use slidegen::{
    assemble, generate, parse_bytes, DeckRequest, Document, Error, TemplateRegistry,
    TemplateStyle, TextAlignment, TextRole,
};

fn registry() -> TemplateRegistry {
    TemplateRegistry::builtin().expect("built-in frames load")
}

fn generate_doc(style: &str, request: &DeckRequest) -> Document {
    let bytes = generate(&registry(), style, request).unwrap();
    parse_bytes(&bytes).unwrap()
}

#[test]
fn test_slide_count_matches_request() {
    for style in TemplateStyle::ALL {
        for n in 1..=6 {
            let request = DeckRequest::new("Deck", "Ann", "Python basics", n);
            let doc = generate_doc(style.as_str(), &request);
            assert_eq!(doc.sections.len(), n as usize, "{} with {} slides", style, n);
        }
    }
}

#[test]
fn test_non_positive_counts_yield_title_slide_only() {
    for n in [0, -4] {
        let doc = generate_doc("light", &DeckRequest::new("Deck", "Ann", "x", n));
        assert_eq!(doc.sections.len(), 1);
    }
}

#[test]
fn test_title_slide_round_trip() {
    let doc = generate_doc("normal", &DeckRequest::new("Rust & XML <1>", "Ann Lee", "x", 1));
    let slide = &doc.sections[0];

    assert_eq!(slide.title().as_deref(), Some("Rust & XML <1>"));
    assert_eq!(
        slide.subtitle().as_deref(),
        Some("By Ann Lee")
    );

    let title = slide.paragraphs.iter().find(|p| p.role == TextRole::Title).unwrap();
    assert_eq!(title.alignment, TextAlignment::Center);
}

#[test]
fn test_content_slides_round_trip() {
    let request = DeckRequest::from_form("Deck", "Ann", "\n Python basics \n ignored", 7);
    let doc = generate_doc("dark", &request);

    for (i, slide) in doc.sections.iter().enumerate().skip(1) {
        assert_eq!(slide.title(), Some(format!("Slide {}", i)));

        let body: Vec<_> = slide.body().collect();
        assert_eq!(body.len(), 1, "slide {} has exactly one content paragraph", i);
        assert_eq!(body[0].plain_text(), PYTHON_POINTS[(i - 1) % PYTHON_POINTS.len()]);
        assert_eq!(body[0].font_size(), Some(1800));
        assert_eq!(body[0].alignment, TextAlignment::Left);
        assert_eq!(body[0].level, 0);
    }
}

#[test]
fn test_topic_falls_back_to_title() {
    let doc = generate_doc("light", &DeckRequest::from_form("Gardening", "Ann", "  \n", 2));
    let body: Vec<_> = doc.sections[1].body().collect();
    assert_eq!(body[0].plain_text(), "Overview of Gardening.");
}

#[test]
fn test_template_slides_are_replaced() {
    let registry = registry();
    let template = registry.get(TemplateStyle::Light).unwrap();
    // The frames ship with two sample slides.
    assert_eq!(template.slides().len(), 2);

    let deck = assemble(&template, &DeckRequest::new("Deck", "Ann", "x", 4)).unwrap();
    let package = deck.to_package().unwrap();

    let slide_parts: Vec<_> = package
        .part_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .collect();
    assert_eq!(slide_parts.len(), 4);
    assert_eq!(
        package
            .content_types()
            .unwrap()
            .parts_of_type(content_type::PML_SLIDE)
            .len(),
        4
    );

    let parser = PptxParser::from_bytes(package.to_bytes().unwrap()).unwrap();
    assert_eq!(parser.slide_ids(), vec![256, 257, 258, 259]);
    for path in parser.slide_paths().unwrap() {
        assert!(package.contains(&path), "{} is present", path);
    }
}

#[test]
fn test_regenerating_from_output_keeps_count() {
    // A generated deck can itself serve as a template.
    let first = generate(&registry(), "light", &DeckRequest::new("A", "B", "x", 5)).unwrap();
    let template = Template::from_bytes(first).unwrap();
    template.validate().unwrap();

    let bytes = assemble(&template, &DeckRequest::new("C", "D", "x", 2))
        .unwrap()
        .to_bytes()
        .unwrap();
    let doc = parse_bytes(&bytes).unwrap();
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.sections[0].title().as_deref(), Some("C"));
}

const TITLE_ONLY_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" preserve="1"><p:cSld name="Title Only"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

fn title_only_template() -> Template {
    let mut package: Package = frame_package(&TemplateStyle::Normal.palette());
    package.set_part("ppt/slideLayouts/slideLayout1.xml", TITLE_ONLY_LAYOUT);
    package.set_part("ppt/slideLayouts/slideLayout2.xml", TITLE_ONLY_LAYOUT);
    Template::from_package(package).unwrap()
}

#[test]
fn test_fallback_text_boxes_round_trip() {
    let template = title_only_template();
    template.validate().unwrap();

    let deck = assemble(&template, &DeckRequest::new("Deck", "Ann", "Gardening", 3)).unwrap();
    let bytes = deck.to_bytes().unwrap();
    let doc = parse_bytes(&bytes).unwrap();
    assert_eq!(doc.sections.len(), 3);

    // Text boxes are not placeholders, so the byline reads back as body text.
    let byline: Vec<_> = doc.sections[0].body().collect();
    assert_eq!(byline.len(), 1);
    assert_eq!(byline[0].plain_text(), "By Ann");
    assert_eq!(byline[0].font_size(), Some(2400));
    assert_eq!(byline[0].alignment, TextAlignment::Center);

    for slide in &doc.sections[1..] {
        let body: Vec<_> = slide.body().collect();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].plain_text(), "Overview of Gardening.");
        assert_eq!(body[0].font_size(), Some(1800));
    }

    let slide_xml = deck.to_package().unwrap().read_xml("ppt/slides/slide1.xml").unwrap();
    assert!(slide_xml.contains(&format!(
        r#"<a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/>"#,
        SUBTITLE_BOX.x, SUBTITLE_BOX.y, SUBTITLE_BOX.cx, SUBTITLE_BOX.cy
    )));
    let slide_xml = deck.to_package().unwrap().read_xml("ppt/slides/slide2.xml").unwrap();
    assert!(slide_xml.contains(&format!(r#"<a:off x="{}" y="{}"/>"#, CONTENT_BOX.x, CONTENT_BOX.y)));
}

#[test]
fn test_template_without_layouts_is_rejected() {
    let mut package = frame_package(&TemplateStyle::Light.palette());
    package.set_part("ppt/slideLayouts/slideLayout1.xml", TITLE_ONLY_LAYOUT.replace(
        r#"<p:ph type="title"/>"#,
        r#"<p:ph type="pic"/>"#,
    ));
    let template = Template::from_package(package).unwrap();
    assert!(matches!(template.validate(), Err(Error::MissingTitle(_))));
    assert!(matches!(
        assemble(&template, &DeckRequest::new("T", "A", "x", 2)),
        Err(Error::MissingTitle(_))
    ));
}

#[test]
fn test_invalid_template_key() {
    let err = generate(&registry(), "invalid", &DeckRequest::new("T", "A", "x", 3)).unwrap_err();
    assert!(matches!(err, Error::InvalidTemplate(_)));
    assert!(err.is_client_error());
}

#[test]
fn test_non_presentation_template_is_rejected() {
    assert!(Template::from_bytes(b"definitely not a zip".to_vec()).is_err());
}
