//! # Card Records
//!
//! The minimal shape of a card as it arrives from upstream (JSON):
//! a title plus whatever other fields the source carries. Only the title
//! is interpreted here — it names the output. Everything else is kept
//! verbatim for round-tripping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest title prefix used in a filename
const TITLE_STEM_LEN: usize = 20;

/// # Card
///
/// A single task card record. Extra source fields ride along untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Display title; also names the card's output file
    pub title: String,
    /// All other source fields, preserved as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Card {
    /// A card with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Filename stem for this card at the given batch position.
    ///
    /// `card_01_Fix_the_boiler` — 1-based zero-padded index, then the
    /// title truncated to 20 chars with whitespace collapsed to
    /// underscores and filesystem-hostile characters dropped.
    pub fn file_stem(&self, index: usize) -> String {
        format!("card_{:02}_{}", index + 1, sanitize_title(&self.title))
    }
}

/// Reduce a title to a filesystem-safe stem fragment
fn sanitize_title(title: &str) -> String {
    let mut stem = String::with_capacity(TITLE_STEM_LEN);
    for c in title.chars().take(TITLE_STEM_LEN) {
        if c.is_whitespace() {
            stem.push('_');
        } else if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
            stem.push(c);
        }
        // anything else (slashes, quotes, control chars) is dropped
    }
    stem
}

// ============================================================================
// TESTS
// ============================================================================
