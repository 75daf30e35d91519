//! # Text Category Classifier
//! Keyword fallback used whenever the vision endpoint is out of play.
//! Fixed per-category vocabularies over the description; deterministic and
//! offline.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::complaint::Category;

/// Confidence granted to a vocabulary hit.
pub const KEYWORD_CONFIDENCE: f32 = 0.75;
/// Confidence when nothing matches and the citizen's own category stands.
pub const FALLBACK_CONFIDENCE: f32 = 0.55;

// Listed order is the tiebreak when a description matches several
// vocabularies.
static VOCABULARY: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    vec![
        (
            Category::Garbage,
            Regex::new(r"(?i)\b(?:garbage|trash|waste|dump|bin)\b").unwrap(),
        ),
        (
            Category::Road,
            Regex::new(r"(?i)\b(?:pothole|road|asphalt|traffic)\b").unwrap(),
        ),
        (
            Category::Water,
            Regex::new(r"(?i)\b(?:water|pipe|leak|sewage|drain|overflow)\b").unwrap(),
        ),
        (
            Category::Streetlight,
            Regex::new(r"(?i)\b(?:streetlight|lamp|light pole)\b").unwrap(),
        ),
    ]
});

/// Classify a description. First vocabulary hit wins at
/// [`KEYWORD_CONFIDENCE`]; no hit falls back to the citizen-submitted
/// category at [`FALLBACK_CONFIDENCE`].
pub fn classify_text(description: &str, citizen_category: Category) -> (Category, f32) {
    for (category, re) in VOCABULARY.iter() {
        if re.is_match(description) {
            return (*category, KEYWORD_CONFIDENCE);
        }
    }
    (citizen_category, FALLBACK_CONFIDENCE)
}
