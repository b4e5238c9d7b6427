//! Main content detection
//!
//! An explicit CSS selector wins when it matches. Otherwise block-level
//! candidates are ranked by a text-density score and the best one is taken;
//! when nothing clears the threshold the whole `<body>` is used.
//!
//! # Scoring
//!
//! Every outermost text block (paragraph, list item, heading, code block,
//! ...) is worth `block_bonus + chars * tag weight`. That value is credited
//! in full to the nearest candidate ancestor and scaled by `parent_decay` to
//! the next one up, so containers that directly hold the prose outrank their
//! outer wrappers. A candidate's final score is
//!
//! ```text
//! credited * (1 - link_density) - wrapper_penalty * empty_wrappers
//! ```
//!
//! where `empty_wrappers` counts descendant layout elements without any text.
//! Ties go to the shallower element, then to document order.
//!
//! This is a ranking heuristic. The weights are fixed constants so tests can
//! pin exact selections on fixed fixtures; they do not prove correctness on
//! arbitrary pages.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Elements that may be chosen as the content region
pub const CANDIDATE_TAGS: &[&str] = &["div", "article", "main", "section"];

/// Layout-only elements counted as wrappers when they hold no text
pub const WRAPPER_TAGS: &[&str] = &["div", "section", "span"];

/// Flat bonus per text block
pub const BLOCK_BONUS: f64 = 5.0;

/// Share of a block's value credited to the second candidate ancestor
pub const PARENT_DECAY: f64 = 0.5;

/// Penalty per empty wrapper element inside a candidate
pub const WRAPPER_PENALTY: f64 = 10.0;

/// Minimum score a candidate needs to beat the body fallback
pub const MIN_CONTENT_SCORE: f64 = 100.0;

/// Per-character weight of each text-bearing block tag
pub const BLOCK_WEIGHTS: &[(&str, f64)] = &[
    ("p", 1.0),
    ("pre", 1.0),
    ("blockquote", 1.0),
    ("li", 0.8),
    ("dd", 0.8),
    ("dt", 0.8),
    ("td", 0.5),
    ("th", 0.5),
    ("h1", 0.5),
    ("h2", 0.5),
    ("h3", 0.5),
    ("h4", 0.5),
    ("h5", 0.5),
    ("h6", 0.5),
];

/// Tunable weights of the scoring function
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub block_bonus: f64,
    pub parent_decay: f64,
    pub wrapper_penalty: f64,
    pub min_score: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            block_bonus: BLOCK_BONUS,
            parent_decay: PARENT_DECAY,
            wrapper_penalty: WRAPPER_PENALTY,
            min_score: MIN_CONTENT_SCORE,
        }
    }
}

/// How the content region was chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionSource {
    /// Matched the explicit selector
    Selector,
    /// Best heuristic candidate, with its score
    Heuristic { score: f64 },
    /// Nothing scored high enough; the whole body was used
    BodyFallback,
}

impl RegionSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::BodyFallback)
    }
}

/// The element chosen as main content
#[derive(Debug, Clone, Copy)]
pub struct ContentRegion<'a> {
    pub element: ElementRef<'a>,
    pub source: RegionSource,
}

impl ContentRegion<'_> {
    /// True when the heuristic found nothing and the body was used
    pub fn is_fallback(&self) -> bool {
        self.source.is_fallback()
    }
}

/// A scored heuristic candidate
#[derive(Debug, Clone, Copy)]
pub struct CandidateScore<'a> {
    pub element: ElementRef<'a>,
    pub score: f64,
    pub depth: usize,
}

/// Locates the main content with default weights
///
/// A selector that matches nothing is not an error: the heuristic runs as
/// if no selector had been given.
pub fn locate<'a>(document: &'a Html, selector: Option<&Selector>) -> ContentRegion<'a> {
    locate_with(document, selector, &ScoringWeights::default())
}

/// Locates the main content with explicit weights
pub fn locate_with<'a>(
    document: &'a Html,
    selector: Option<&Selector>,
    weights: &ScoringWeights,
) -> ContentRegion<'a> {
    if let Some(selector) = selector {
        if let Some(element) = document.select(selector).next() {
            return ContentRegion {
                element,
                source: RegionSource::Selector,
            };
        }
        tracing::debug!("Main content selector matched nothing, using heuristic");
    }

    match best_candidate(document, weights) {
        Some(best) => {
            tracing::debug!(
                "Heuristic picked <{}> at depth {} with score {:.1}",
                best.element.value().name(),
                best.depth,
                best.score
            );
            ContentRegion {
                element: best.element,
                source: RegionSource::Heuristic { score: best.score },
            }
        }
        None => ContentRegion {
            element: body(document),
            source: RegionSource::BodyFallback,
        },
    }
}

/// Returns the highest-scoring candidate above the threshold
pub fn best_candidate<'a>(document: &'a Html, weights: &ScoringWeights) -> Option<CandidateScore<'a>> {
    let mut best: Option<CandidateScore<'a>> = None;

    for candidate in score_candidates(document, weights) {
        if candidate.score < weights.min_score {
            continue;
        }

        let better = match &best {
            None => true,
            Some(current) => {
                candidate.score > current.score
                    || (candidate.score == current.score && candidate.depth < current.depth)
            }
        };

        if better {
            best = Some(candidate);
        }
    }

    best
}

/// Scores every candidate that received credit from at least one text block
///
/// Candidates come back in document order.
pub fn score_candidates<'a>(document: &'a Html, weights: &ScoringWeights) -> Vec<CandidateScore<'a>> {
    let mut credited: HashMap<NodeId, f64> = HashMap::new();

    for element in elements(document) {
        let Some(tag_weight) = block_weight(element.value().name()) else {
            continue;
        };
        if has_block_ancestor(element) {
            continue;
        }

        let chars = text_len(element);
        if chars == 0 {
            continue;
        }
        let value = weights.block_bonus + chars as f64 * tag_weight;

        let mut share = 1.0;
        for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
            if !is_candidate(ancestor) {
                continue;
            }
            *credited.entry(ancestor.id()).or_insert(0.0) += value * share;
            if share < 1.0 {
                break;
            }
            share = weights.parent_decay;
        }
    }

    elements(document)
        .filter_map(|element| {
            let raw = *credited.get(&element.id())?;
            let score = raw * (1.0 - link_density(element))
                - weights.wrapper_penalty * empty_wrappers(element) as f64;
            Some(CandidateScore {
                element,
                score,
                depth: element.ancestors().count(),
            })
        })
        .collect()
}

fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.tree.root().descendants().filter_map(ElementRef::wrap)
}

fn body(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}

fn block_weight(name: &str) -> Option<f64> {
    BLOCK_WEIGHTS
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, weight)| *weight)
}

fn is_candidate(element: ElementRef<'_>) -> bool {
    CANDIDATE_TAGS.contains(&element.value().name())
}

fn has_block_ancestor(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| block_weight(ancestor.value().name()).is_some())
}

/// Character count with whitespace runs collapsed to one space
fn text_len(element: ElementRef<'_>) -> usize {
    let text: String = element.text().collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0;
    }
    words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len() - 1
}

/// Share of the element's text that sits inside links
fn link_density(element: ElementRef<'_>) -> f64 {
    let total = text_len(element);
    if total == 0 {
        return 0.0;
    }

    let linked: usize = element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "a")
        .map(text_len)
        .sum();

    (linked as f64 / total as f64).min(1.0)
}

/// Descendant layout elements with no text at all
fn empty_wrappers(element: ElementRef<'_>) -> usize {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|e| WRAPPER_TAGS.contains(&e.value().name()) && text_len(*e) == 0)
        .count()
}
