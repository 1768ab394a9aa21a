//! Built-in template decks.
//!
//! A frame is a complete, minimal presentation package: one slide master
//! carrying the palette, a "Title Slide" layout (`ctrTitle` + `subTitle`) and
//! a "Title and Content" layout (`title` + generic content), a theme, and two
//! sample slides showing both layouts.

use super::slide::{Rect, Slide, TextFrame, TextParagraph};
use super::template::{Template, CONTENT_LAYOUT, TITLE_LAYOUT};
use super::writer::write_deck;
use crate::container::{escape_xml, Relationship, Relationships};
use crate::error::Result;
use crate::package::{content_type, rel_type, ContentTypes, Package};
use std::fmt::Write as FmtWrite;

/// Colors of a frame, as `RRGGBB` hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub background: &'static str,
    pub text: &'static str,
}

const NS_DECLS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

const SLIDE_WIDTH: i64 = 9_144_000;
const SLIDE_HEIGHT: i64 = 6_858_000;

const MASTER_TITLE: Rect = Rect { x: 457_200, y: 274_638, cx: 8_229_600, cy: 1_143_000 };
const MASTER_BODY: Rect = Rect { x: 457_200, y: 1_600_200, cx: 8_229_600, cy: 4_525_963 };
const CENTER_TITLE: Rect = Rect { x: 685_800, y: 2_130_425, cx: 7_772_400, cy: 1_470_025 };
const SUBTITLE: Rect = Rect { x: 1_371_600, y: 3_886_200, cx: 6_400_800, cy: 1_752_600 };

const GROUP_SHAPE: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn placeholder_shape(
    xml: &mut String,
    id: u32,
    name: &str,
    ph: &str,
    rect: Option<Rect>,
    prompt: &str,
) {
    xml.push_str("<p:sp><p:nvSpPr>");
    let _ = write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, escape_xml(name));
    let _ = write!(
        xml,
        r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{}</p:nvPr></p:nvSpPr>"#,
        ph
    );
    match rect {
        Some(r) => {
            let _ = write!(
                xml,
                r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr>"#,
                r.x, r.y, r.cx, r.cy
            );
        }
        None => xml.push_str("<p:spPr/>"),
    }
    let _ = write!(
        xml,
        r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        escape_xml(prompt)
    );
}

fn text_fill(color: &str) -> String {
    format!(r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color)
}

fn master_xml(palette: &Palette) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    let _ = write!(xml, "<p:sldMaster {}>", NS_DECLS);
    let _ = write!(
        xml,
        "<p:cSld><p:bg><p:bgPr>{}<a:effectLst/></p:bgPr></p:bg><p:spTree>{}",
        text_fill(palette.background),
        GROUP_SHAPE
    );
    placeholder_shape(
        &mut xml,
        2,
        "Title Placeholder 1",
        r#"<p:ph type="title"/>"#,
        Some(MASTER_TITLE),
        "Click to edit Master title style",
    );
    placeholder_shape(
        &mut xml,
        3,
        "Text Placeholder 2",
        r#"<p:ph type="body" idx="1"/>"#,
        Some(MASTER_BODY),
        "Click to edit Master text styles",
    );
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(concat!(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
        r#"hlink="hlink" folHlink="folHlink"/>"#
    ));
    xml.push_str(concat!(
        r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/>"#,
        r#"<p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst>"#
    ));
    let fill = text_fill(palette.text);
    let _ = write!(
        xml,
        concat!(
            r#"<p:txStyles><p:titleStyle><a:lvl1pPr algn="ctr"><a:defRPr sz="4400">{0}"#,
            r#"<a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/>"#,
            r#"</a:defRPr></a:lvl1pPr></p:titleStyle>"#,
            r#"<p:bodyStyle><a:lvl1pPr marL="342900" indent="-342900"><a:buFont typeface="Arial"/>"#,
            r#"<a:buChar char="&#8226;"/><a:defRPr sz="3200">{0}"#,
            r#"<a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/>"#,
            r#"</a:defRPr></a:lvl1pPr></p:bodyStyle>"#,
            r#"<p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:otherStyle></p:txStyles>"#
        ),
        fill
    );
    xml.push_str("</p:sldMaster>");
    xml
}

fn layout_xml(layout_type: &str, name: &str, shapes: impl FnOnce(&mut String)) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:sldLayout {} type="{}" preserve="1"><p:cSld name="{}"><p:spTree>{}"#,
        NS_DECLS,
        layout_type,
        escape_xml(name),
        GROUP_SHAPE
    );
    shapes(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    xml
}

fn title_layout_xml() -> String {
    layout_xml("title", "Title Slide", |xml| {
        placeholder_shape(
            xml,
            2,
            "Title 1",
            r#"<p:ph type="ctrTitle"/>"#,
            Some(CENTER_TITLE),
            "Click to edit Master title style",
        );
        placeholder_shape(
            xml,
            3,
            "Subtitle 2",
            r#"<p:ph type="subTitle" idx="1"/>"#,
            Some(SUBTITLE),
            "Click to edit Master subtitle style",
        );
    })
}

fn content_layout_xml() -> String {
    layout_xml("obj", "Title and Content", |xml| {
        placeholder_shape(
            xml,
            2,
            "Title 1",
            r#"<p:ph type="title"/>"#,
            None,
            "Click to edit Master title style",
        );
        placeholder_shape(
            xml,
            3,
            "Content Placeholder 2",
            r#"<p:ph idx="1"/>"#,
            None,
            "Click to edit Master text styles",
        );
    })
}

fn theme_xml() -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
    );
    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (slot, color) in [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ] {
        let _ = write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, slot, color);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    for font in ["majorFont", "minorFont"] {
        let _ = write!(
            xml,
            r#"<a:{0}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{0}>"#,
            font
        );
    }
    xml.push_str("</a:fontScheme>");

    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str(r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#);
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [9525, 25400, 38100] {
        let _ = write!(xml, r#"<a:ln w="{}">{}</a:ln>"#, width, solid);
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");
    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}

fn presentation_xml() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, NS_DECLS);
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    let _ = write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/><p:notesSz cx="{}" cy="{}"/>"#,
        SLIDE_WIDTH, SLIDE_HEIGHT, SLIDE_HEIGHT, SLIDE_WIDTH
    );
    xml.push_str("</p:presentation>");
    xml
}

fn core_xml(palette: &Palette) -> String {
    format!(
        concat!(
            "{}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{} frame</dc:title><dc:creator>slidegen</dc:creator>",
            "</cp:coreProperties>"
        ),
        XML_DECL,
        escape_xml(palette.name)
    )
}

fn app_xml() -> String {
    format!(
        concat!(
            "{}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>slidegen</Application></Properties>"
        ),
        XML_DECL
    )
}

fn rels(items: &[(&str, &str, &str)]) -> Relationships {
    let mut rels = Relationships::new();
    for (id, kind, target) in items {
        rels.add(Relationship::internal(*id, *kind, *target));
    }
    rels
}

/// The frame package without any slides.
pub fn frame_package(palette: &Palette) -> Package {
    let mut package = Package::new();

    let mut types = ContentTypes::new();
    types.add_default("rels", content_type::OPC_RELATIONSHIPS);
    types.add_default("xml", content_type::XML);
    for (part, ct) in [
        ("ppt/presentation.xml", content_type::PML_PRESENTATION_MAIN),
        ("ppt/slideMasters/slideMaster1.xml", content_type::PML_SLIDE_MASTER),
        ("ppt/slideLayouts/slideLayout1.xml", content_type::PML_SLIDE_LAYOUT),
        ("ppt/slideLayouts/slideLayout2.xml", content_type::PML_SLIDE_LAYOUT),
        ("ppt/theme/theme1.xml", content_type::DML_THEME),
        ("docProps/core.xml", content_type::OPC_CORE_PROPERTIES),
        ("docProps/app.xml", content_type::OFC_EXTENDED_PROPERTIES),
    ] {
        types.add_override(part, ct);
    }
    package.set_content_types(&types);

    package.set_relationships(
        "",
        &rels(&[
            ("rId1", rel_type::OFFICE_DOCUMENT, "ppt/presentation.xml"),
            ("rId2", rel_type::CORE_PROPERTIES, "docProps/core.xml"),
            ("rId3", rel_type::EXTENDED_PROPERTIES, "docProps/app.xml"),
        ]),
    );
    package.set_part("docProps/core.xml", core_xml(palette));
    package.set_part("docProps/app.xml", app_xml());

    package.set_part("ppt/presentation.xml", presentation_xml());
    package.set_relationships(
        "ppt/presentation.xml",
        &rels(&[
            ("rId1", rel_type::SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            ("rId2", rel_type::THEME, "theme/theme1.xml"),
        ]),
    );

    package.set_part("ppt/slideMasters/slideMaster1.xml", master_xml(palette));
    package.set_relationships(
        "ppt/slideMasters/slideMaster1.xml",
        &rels(&[
            ("rId1", rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            ("rId2", rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml"),
            ("rId3", rel_type::THEME, "../theme/theme1.xml"),
        ]),
    );

    let master_rel = [(
        "rId1",
        rel_type::SLIDE_MASTER,
        "../slideMasters/slideMaster1.xml",
    )];
    package.set_part("ppt/slideLayouts/slideLayout1.xml", title_layout_xml());
    package.set_relationships("ppt/slideLayouts/slideLayout1.xml", &rels(&master_rel));
    package.set_part("ppt/slideLayouts/slideLayout2.xml", content_layout_xml());
    package.set_relationships("ppt/slideLayouts/slideLayout2.xml", &rels(&master_rel));

    package.set_part("ppt/theme/theme1.xml", theme_xml());
    package
}

fn sample_slides(template: &Template) -> Result<Vec<Slide>> {
    let title_slide = Slide::from_layout(TITLE_LAYOUT, template.layout(TITLE_LAYOUT)?)
        .with_title(TextParagraph::new("Title").sized(44))?;
    let subtitle_id = title_slide
        .placeholders()
        .find(|p| !p.kind.is_title())
        .map(|p| p.shape_id);
    let title_slide = match subtitle_id {
        Some(id) => title_slide
            .with_placeholder_text(id, TextFrame::single(TextParagraph::new("Subtitle").sized(24)))?,
        None => title_slide,
    };

    let content_slide = Slide::from_layout(CONTENT_LAYOUT, template.layout(CONTENT_LAYOUT)?)
        .with_title(TextParagraph::new("Slide Title").sized(36))?;
    let content_id = content_slide
        .placeholders()
        .find(|p| !p.kind.is_title())
        .map(|p| p.shape_id);
    let content_slide = match content_id {
        Some(id) => content_slide.with_placeholder_text(
            id,
            TextFrame::single(TextParagraph::new("Content goes here").sized(18)),
        )?,
        None => content_slide,
    };

    Ok(vec![title_slide, content_slide])
}

/// Build a frame as `.pptx` bytes, including the two sample slides.
pub fn build_frame(palette: &Palette) -> Result<Vec<u8>> {
    let template = Template::from_package(frame_package(palette))?;
    let slides = sample_slides(&template)?;
    write_deck(&template, &slides)
}

/// Load a frame directly as a template.
pub fn frame_template(palette: &Palette) -> Result<Template> {
    Template::from_bytes(build_frame(palette)?)
}
