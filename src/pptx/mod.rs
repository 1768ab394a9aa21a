//! PPTX (PowerPoint) presentation support.
//!
//! Reading ([`PptxParser`]), template indexing ([`Template`]), slide
//! construction ([`Slide`]) and serialization ([`write_deck`]) for the
//! Office Open XML (.pptx) format, plus the built-in frames.

pub mod frame;
pub mod layout;
mod parser;
pub mod slide;
pub mod template;
pub mod writer;

pub use layout::{Layout, LayoutPlaceholder, PlaceholderKind};
pub use parser::{parse_slide_text, PptxParser};
pub use slide::{pt, Placeholder, Rect, Shape, Slide, TextBox, TextFrame, TextParagraph};
pub use template::{SlideRef, SlideSize, Template, CONTENT_LAYOUT, TITLE_LAYOUT};
pub use writer::{build_package, clear_slides, write_deck};
