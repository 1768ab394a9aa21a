//! # slidegen
//!
//! Template-driven PowerPoint deck generation.
//!
//! A deck is built from a template presentation: the template's slides are
//! dropped, a title slide and a run of content slides are added from its
//! first two layouts, and text goes into the matching placeholders (or into
//! positioned text boxes when a layout lacks them).
//!
//! ## Quick Start
//!
//! ```no_run
//! use slidegen::{generate, DeckRequest, TemplateRegistry};
//!
//! let registry = TemplateRegistry::builtin()?;
//! let request = DeckRequest::from_form("Rust 101", "Ann", "Ownership and borrowing", 5);
//!
//! let bytes = generate(&registry, "dark", &request)?;
//! std::fs::write("rust-101.pptx", bytes)?;
//! # Ok::<(), slidegen::Error>(())
//! ```
//!
//! ## Reading decks back
//!
//! ```no_run
//! let doc = slidegen::parse_file("rust-101.pptx")?;
//! for section in &doc.sections {
//!     println!("{:?}", section.title());
//! }
//! # Ok::<(), slidegen::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: async file emission with Tokio

pub mod container;
pub mod deck;
pub mod detect;
pub mod error;
pub mod model;
pub mod package;
pub mod pptx;
pub mod store;
pub mod templates;

// Re-exports
pub use container::{OoxmlContainer, Relationship, Relationships};
pub use deck::{assemble, synthesize, Deck, DeckRequest, PlaceholderRole};
pub use detect::{detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, Result};
pub use model::{
    Document, Metadata, Paragraph, Section, TextAlignment, TextRole, TextRun, TextStyle,
};
pub use pptx::{PlaceholderKind, Template};
pub use store::{GeneratedFile, OutputStore, RetentionPolicy};
pub use templates::{TemplateRegistry, TemplateSource, TemplateStyle};

use std::path::Path;

/// Assemble a deck with the template registered under `style` and return
/// it as `.pptx` bytes.
///
/// An unknown style fails with [`Error::InvalidTemplate`] before any deck
/// work is done.
pub fn generate(registry: &TemplateRegistry, style: &str, request: &DeckRequest) -> Result<Vec<u8>> {
    let template = registry.resolve(style)?;
    assemble(&template, request)?.to_bytes()
}

/// Parse a presentation file into a [`Document`], one section per slide.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    match detect_format_from_path(path)? {
        FormatType::Pptx => pptx::PptxParser::open(path)?.parse(),
        other => Err(Error::UnsupportedFormat(other.name().to_string())),
    }
}

/// Parse presentation bytes into a [`Document`].
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    match detect_format_from_bytes(data)? {
        FormatType::Pptx => pptx::PptxParser::from_bytes(data.to_vec())?.parse(),
        other => Err(Error::UnsupportedFormat(other.name().to_string())),
    }
}

/// Extract the plain text of every slide.
pub fn extract_text(path: impl AsRef<Path>) -> Result<String> {
    Ok(parse_file(path)?.plain_text())
}
