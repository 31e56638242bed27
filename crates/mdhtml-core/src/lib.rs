mod block;
mod document;
mod escape;
mod html;
mod input;
mod refs;
mod render;
mod span;
mod tags;
mod token;

pub use document::{
    DEFAULT_SPACES_PER_TAB, Document, DocumentKind, Error, Options, Processor, SyntaxHighlighter,
    VerbatimHighlighter,
};
pub use refs::{LinkIds, Target};
pub use token::{EmphasisMarker, MarkerState, Token, TokenGroup};
