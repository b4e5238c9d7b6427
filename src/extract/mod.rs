//! Content extraction
//!
//! Turns a fetched documentation page into Markdown in three steps:
//! boilerplate removal, main-content location and structural conversion.

pub mod cleaner;
pub mod locator;
pub mod markdown;

pub use cleaner::{clean, is_denylisted, DENYLISTED_CLASSES, DENYLISTED_TAGS};
pub use locator::{
    locate, locate_with, CandidateScore, ContentRegion, RegionSource, ScoringWeights,
};
pub use markdown::{to_markdown, MarkdownConverter};
