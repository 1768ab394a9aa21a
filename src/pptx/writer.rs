//! Deck serialization: strip a template's slides, add new ones, and zip the
//! result.

use super::slide::Slide;
use super::template::{parse_presentation_xml, SlideId, Template};
use crate::container::{OoxmlContainer, Relationship, Relationships};
use crate::error::{Error, Result};
use crate::package::{content_type, rel_type, Package};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::collections::BTreeSet;
use std::io::{Cursor, Write};

/// First id PowerPoint accepts in `p:sldIdLst`.
pub const SLIDE_ID_BASE: u32 = 256;

const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Children of `p:presentation` that precede `p:sldIdLst`.
const BEFORE_SLIDE_LIST: [&[u8]; 3] = [
    b"sldMasterIdLst",
    b"notesMasterIdLst",
    b"handoutMasterIdLst",
];

#[derive(Debug, Default)]
struct Prefixes {
    /// Element prefix including the colon, or empty for a default namespace.
    element: String,
    /// Prefix bound to the relationships namespace.
    rel: String,
}

fn prepare_root(e: &BytesStart<'_>) -> (BytesStart<'static>, Prefixes) {
    let element = e
        .name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default();

    let declared = e.attributes().flatten().find_map(|a| {
        let prefix = a.key.as_ref().strip_prefix(b"xmlns:")?;
        (a.value.as_ref() == RELATIONSHIPS_NS.as_bytes())
            .then(|| String::from_utf8_lossy(prefix).into_owned())
    });

    let mut root = e.clone().into_owned();
    let rel = match declared {
        Some(prefix) => prefix,
        None => {
            root.push_attribute(("xmlns:r", RELATIONSHIPS_NS));
            "r".to_string()
        }
    };

    (root, Prefixes { element, rel })
}

fn write_slide_list<W: Write>(
    writer: &mut quick_xml::Writer<W>,
    prefixes: &Prefixes,
    slides: &[SlideId],
) -> Result<()> {
    if slides.is_empty() {
        return Ok(());
    }

    let list = format!("{}sldIdLst", prefixes.element);
    let item = format!("{}sldId", prefixes.element);
    let rel_attr = format!("{}:id", prefixes.rel);

    writer.write_event(Event::Start(BytesStart::new(list.as_str())))?;
    for slide in slides {
        let id = slide.id.to_string();
        let entry = BytesStart::new(item.as_str())
            .with_attributes([("id", id.as_str()), (rel_attr.as_str(), slide.rel_id.as_str())]);
        writer.write_event(Event::Empty(entry))?;
    }
    writer.write_event(Event::End(BytesEnd::new(list.as_str())))?;
    Ok(())
}

/// Replace the `sldIdLst` of a `presentation.xml` document.
///
/// The list is dropped entirely when `slides` is empty. Everything else in
/// the document is copied through unchanged.
pub fn rewrite_slide_list(xml: &str, slides: &[SlideId]) -> Result<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut writer = quick_xml::Writer::new(Cursor::new(Vec::new()));
    let mut prefixes = Prefixes::default();
    let mut depth = 0usize;
    let mut skipping = false;
    let mut inserted = false;

    loop {
        let event = reader.read_event()?;

        if skipping {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    skipping = depth > 1;
                }
                Event::Eof => {
                    return Err(Error::XmlParse("unterminated sldIdLst".to_string()));
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Eof => break,
            Event::Start(e) if depth == 0 => {
                let (root, found) = prepare_root(&e);
                prefixes = found;
                writer.write_event(Event::Start(root))?;
                depth = 1;
            }
            Event::Empty(e) if depth == 0 => {
                let (root, found) = prepare_root(&e);
                prefixes = found;
                let end = BytesEnd::new(String::from_utf8_lossy(root.name().as_ref()).into_owned());
                writer.write_event(Event::Start(root))?;
                write_slide_list(&mut writer, &prefixes, slides)?;
                writer.write_event(Event::End(end))?;
                inserted = true;
            }
            Event::Start(e) if depth == 1 && e.local_name().as_ref() == b"sldIdLst" => {
                skipping = true;
                depth += 1;
            }
            Event::Empty(e) if depth == 1 && e.local_name().as_ref() == b"sldIdLst" => {}
            Event::Start(e) => {
                if depth == 1 && !inserted && !BEFORE_SLIDE_LIST.contains(&e.local_name().as_ref())
                {
                    write_slide_list(&mut writer, &prefixes, slides)?;
                    inserted = true;
                }
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if depth == 1 && !inserted && !BEFORE_SLIDE_LIST.contains(&e.local_name().as_ref())
                {
                    write_slide_list(&mut writer, &prefixes, slides)?;
                    inserted = true;
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                if depth == 1 && !inserted {
                    write_slide_list(&mut writer, &prefixes, slides)?;
                    inserted = true;
                }
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))?;
            }
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

fn is_rels_part(name: &str) -> bool {
    name.ends_with(".rels")
}

/// Source part of a `.rels` part: `ppt/_rels/presentation.xml.rels` belongs
/// to `ppt/presentation.xml`, `_rels/.rels` to the package itself.
fn rels_source(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".rels")?;
    let (dir, file) = match stem.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", stem),
    };
    let parent = match dir.strip_suffix("_rels") {
        Some(parent) => parent,
        None => return None,
    };
    Some(format!("{}{}", parent, file))
}

/// Remove every part that can no longer be reached from the package
/// relationships, along with its `.rels` part and content-type override.
///
/// Returns the names of the removed parts.
pub fn prune_unreachable(package: &mut Package) -> Result<Vec<String>> {
    let mut reachable = BTreeSet::new();
    let mut queue = vec![String::new()];
    while let Some(source) = queue.pop() {
        for rel in package.relationships(&source)?.iter() {
            if rel.external {
                continue;
            }
            let target = OoxmlContainer::resolve_path(&source, &rel.target);
            if package.contains(&target) && reachable.insert(target.clone()) {
                queue.push(target);
            }
        }
    }

    let orphans: Vec<String> = package
        .part_names()
        .filter(|name| *name != "[Content_Types].xml")
        .filter(|name| {
            if is_rels_part(name) {
                match rels_source(name) {
                    Some(source) => !source.is_empty() && !reachable.contains(&source),
                    None => false,
                }
            } else {
                !reachable.contains(*name)
            }
        })
        .map(String::from)
        .collect();

    if !orphans.is_empty() {
        let mut types = package.content_types()?;
        for name in &orphans {
            package.remove_part(name);
            types.remove_override(name);
        }
        package.set_content_types(&types);
    }

    Ok(orphans)
}

/// Remove every slide from a presentation: its relationship from the
/// presentation part and its `sldId` entry, then the slide parts that became
/// unreachable (slides, their `.rels`, notes slides).
///
/// Returns the number of slides removed.
pub fn clear_slides(package: &mut Package, presentation_path: &str) -> Result<usize> {
    let mut rels = package.relationships(presentation_path)?;
    let slide_rel_ids: Vec<String> = rels
        .get_by_type(rel_type::SLIDE)
        .into_iter()
        .map(|r| r.id.clone())
        .collect();
    for rel_id in &slide_rel_ids {
        rels.remove(rel_id);
    }
    package.set_relationships(presentation_path, &rels);

    let xml = rewrite_slide_list(&package.read_xml(presentation_path)?, &[])?;
    package.set_part(presentation_path, xml);

    let pruned = prune_unreachable(package)?;

    let remaining = parse_presentation_xml(&package.read_xml(presentation_path)?)?
        .slides
        .len();
    let remaining_rels = package
        .relationships(presentation_path)?
        .get_by_type(rel_type::SLIDE)
        .len();
    if remaining != 0 || remaining_rels != 0 {
        return Err(Error::Assembly(format!(
            "{} slides still listed after clearing the template",
            remaining.max(remaining_rels)
        )));
    }

    log::debug!(
        "cleared {} template slides, pruned {} parts",
        slide_rel_ids.len(),
        pruned.len()
    );
    Ok(slide_rel_ids.len())
}

fn free_slide_part_name(package: &Package, slides_dir: &str, start: usize) -> (String, usize) {
    let mut n = start;
    loop {
        let name = format!("{}slide{}.xml", slides_dir, n);
        if !package.contains(&name) {
            return (name, n);
        }
        n += 1;
    }
}

/// Build the output package: the template with its slides replaced by `slides`.
pub fn build_package(template: &Template, slides: &[Slide]) -> Result<Package> {
    let mut package = template.package().clone();
    let presentation_path = template.presentation_path();

    clear_slides(&mut package, presentation_path)?;

    let slides_dir = match presentation_path.rsplit_once('/') {
        Some((dir, _)) => format!("{}/slides/", dir),
        None => "slides/".to_string(),
    };

    let mut presentation_rels = package.relationships(presentation_path)?;
    let mut types = package.content_types()?;
    let mut entries = Vec::with_capacity(slides.len());
    let mut next_number = 1;

    for (i, slide) in slides.iter().enumerate() {
        let layout = template.layout(slide.layout_index)?;
        let (part_name, number) = free_slide_part_name(&package, &slides_dir, next_number);
        next_number = number + 1;

        package.set_part(&part_name, slide.to_xml());

        let mut slide_rels = Relationships::new();
        slide_rels.add(Relationship::internal(
            "rId1",
            rel_type::SLIDE_LAYOUT,
            OoxmlContainer::relative_target(&part_name, &layout.part_name),
        ));
        package.set_relationships(&part_name, &slide_rels);
        types.add_override(&part_name, content_type::PML_SLIDE);

        let rel_id = presentation_rels.next_id();
        presentation_rels.add(Relationship::internal(
            rel_id.clone(),
            rel_type::SLIDE,
            OoxmlContainer::relative_target(presentation_path, &part_name),
        ));
        entries.push(SlideId {
            id: SLIDE_ID_BASE + i as u32,
            rel_id,
        });
    }

    package.set_relationships(presentation_path, &presentation_rels);
    package.set_content_types(&types);

    let xml = rewrite_slide_list(&package.read_xml(presentation_path)?, &entries)?;
    package.set_part(presentation_path, xml);

    Ok(package)
}

/// Serialize the template with its slides replaced by `slides`.
pub fn write_deck(template: &Template, slides: &[Slide]) -> Result<Vec<u8>> {
    build_package(template, slides)?.to_bytes()
}
