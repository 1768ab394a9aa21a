//! Placeholder lookup by semantic role.

use crate::pptx::{Placeholder, PlaceholderKind, Slide};

/// What a placeholder is wanted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderRole {
    /// The "By {author}" line of the title slide.
    Subtitle,
    /// The body text of a content slide.
    Content,
}

impl PlaceholderRole {
    /// Placeholder kinds that can fill this role.
    ///
    /// The subtitle role also accepts title-kind placeholders. Only the
    /// slide's own title shape is excluded from the search, so a second
    /// title placeholder on a layout will receive the author line.
    pub fn accepts(&self, kind: PlaceholderKind) -> bool {
        match self {
            PlaceholderRole::Subtitle => kind.is_title() || kind == PlaceholderKind::Subtitle,
            PlaceholderRole::Content => {
                matches!(kind, PlaceholderKind::Body | PlaceholderKind::Text)
            }
        }
    }
}

/// First placeholder on `slide`, in shape order, that can fill `role`,
/// skipping the slide's title shape.
pub fn resolve(slide: &Slide, role: PlaceholderRole) -> Option<&Placeholder> {
    let title_id = slide.title().map(|t| t.shape_id);
    slide
        .placeholders()
        .filter(|p| Some(p.shape_id) != title_id)
        .find(|p| role.accepts(p.kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::{Layout, LayoutPlaceholder};

    fn slide(kinds: &[PlaceholderKind]) -> Slide {
        let layout = Layout {
            name: "Test".to_string(),
            part_name: "ppt/slideLayouts/slideLayout1.xml".to_string(),
            placeholders: kinds
                .iter()
                .enumerate()
                .map(|(idx, kind)| LayoutPlaceholder {
                    kind: *kind,
                    idx: idx as u32,
                    name: String::new(),
                })
                .collect(),
        };
        Slide::from_layout(0, &layout)
    }

    #[test]
    fn test_subtitle_found() {
        let s = slide(&[PlaceholderKind::CenterTitle, PlaceholderKind::Subtitle]);
        let found = resolve(&s, PlaceholderRole::Subtitle).unwrap();
        assert_eq!(found.kind, PlaceholderKind::Subtitle);
    }

    #[test]
    fn test_title_shape_is_excluded() {
        let s = slide(&[PlaceholderKind::Title]);
        assert!(resolve(&s, PlaceholderRole::Subtitle).is_none());
    }

    #[test]
    fn test_second_title_fills_subtitle_role() {
        let s = slide(&[PlaceholderKind::Title, PlaceholderKind::Title]);
        let found = resolve(&s, PlaceholderRole::Subtitle).unwrap();
        assert_eq!(found.shape_id, 3);
    }

    #[test]
    fn test_content_accepts_body_and_text() {
        let body = slide(&[PlaceholderKind::Title, PlaceholderKind::Body]);
        assert_eq!(
            resolve(&body, PlaceholderRole::Content).map(|p| p.kind),
            Some(PlaceholderKind::Body)
        );

        let obj = slide(&[PlaceholderKind::Title, PlaceholderKind::Text]);
        assert_eq!(
            resolve(&obj, PlaceholderRole::Content).map(|p| p.kind),
            Some(PlaceholderKind::Text)
        );
    }

    #[test]
    fn test_content_ignores_other_kinds() {
        let s = slide(&[
            PlaceholderKind::Title,
            PlaceholderKind::Subtitle,
            PlaceholderKind::Picture,
            PlaceholderKind::Chart,
        ]);
        assert!(resolve(&s, PlaceholderRole::Content).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let s = slide(&[
            PlaceholderKind::Title,
            PlaceholderKind::Text,
            PlaceholderKind::Body,
        ]);
        assert_eq!(resolve(&s, PlaceholderRole::Content).unwrap().shape_id, 3);
    }
}
