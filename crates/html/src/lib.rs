//! Markup tokenizer, entity decoding and the tag tree its events build.

mod entities;
mod event;
mod tag;
mod tokenizer;
mod tree_builder;

pub use crate::entities::{MAX_REFERENCE_LEN, decode_entity};
pub use crate::event::{Attributes, Event, EventCollector, ParserListener};
pub use crate::tag::{Ancestors, CssProperties, Tag, TagId, TagTree};
pub use crate::tokenizer::{
    Tokenizer, TokenizerConfig, TokenizerState, TokenizerStats, tokenize, tokenize_with,
};
pub use crate::tree_builder::{TreeBuilder, build_tag_tree};
