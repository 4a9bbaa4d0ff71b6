//! Payment-slip field extraction module.

mod merge;
mod parser;
pub mod rules;

pub use merge::FieldMergeResolver;
pub use parser::{SlipExtraction, SlipParser};
