//! Deck generation: content synthesis, placeholder resolution and assembly.

mod assemble;
mod resolve;
mod synth;

pub use assemble::{assemble, Deck, DeckRequest, Stage, CONTENT_BOX, SUBTITLE_BOX};
pub use resolve::{resolve, PlaceholderRole};
pub use synth::{synthesize, DEFAULT_TOPIC, PYTHON_POINTS};
