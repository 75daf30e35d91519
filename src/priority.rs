//! # Priority Assignor
//! Pure rules over {final category, description}, case-insensitive substring
//! match. High rules run before Low, first match wins, no scoring.

use crate::complaint::{Category, Priority};

// Category-specific phrases that force High.
const HIGH_RULES: &[(Category, &[&str])] = &[
    (Category::Water, &["leak", "burst", "overflow"]),
    (Category::Road, &["accident", "pothole", "big"]),
    (Category::Garbage, &["overflow", "too much"]),
];

// Generic softeners that mark a report Low when no High rule fired.
const LOW_KEYWORDS: &[&str] = &["minor", "small", "request", "info"];

pub fn assign_priority(category: Category, description: &str) -> Priority {
    let text = description.to_lowercase();
    for (rule_category, keywords) in HIGH_RULES {
        if *rule_category == category && keywords.iter().any(|k| text.contains(k)) {
            return Priority::High;
        }
    }
    if LOW_KEYWORDS.iter().any(|k| text.contains(k)) {
        return Priority::Low;
    }
    Priority::Medium
}
