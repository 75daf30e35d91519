//! # Spam Heuristics
//! Local, deterministic content-quality checks over the submitted
//! description. Each triggered check yields a human-readable reason. This
//! module never calls external services and never blocks; the store-backed
//! repetition count is gathered by the coordinator and passed in.

use once_cell::sync::Lazy;
use regex::Regex;

/// Filing the same normalized text this many times within the window marks
/// further copies as spam.
pub const REPEAT_THRESHOLD: u32 = 2;
/// Trailing window for the reporter-repetition check, in days.
pub const REPEAT_WINDOW_DAYS: i64 = 7;

const MIN_DESCRIPTION_CHARS: usize = 8;
const CHAR_RUN_LIMIT: usize = 7;
const TOKEN_REPEAT_LIMIT: usize = 3;
const MAX_NORMALIZED_CHARS: usize = 1500;

/// Low-effort filler vocabulary. A description made only of these tokens
/// (or bare numbers) is test noise, not a report.
const TEST_TOKENS: &[&str] = &[
    "test", "testing", "tested", "asdf", "asdfgh", "qwerty", "abc", "abcd",
    "xyz", "aaa", "bbb", "hello", "hi", "ok", "okay", "dummy", "sample",
    "demo", "check", "checking", "na", "none", "nothing", "lorem", "ipsum",
];

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)\S+|\b[a-z0-9][a-z0-9-]*\.(?:com|net|org|io|in|gov|ly)\b")
        .unwrap()
});

/// Outcome of one heuristic pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamScan {
    pub flagged: bool,
    pub reasons: Vec<String>,
}

impl SpamScan {
    /// Reasons concatenated for the rejection message.
    pub fn reason_line(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Canonical form of a description for comparison and storage lookups:
/// HTML entities decoded, tags stripped, curly quotes flattened, lowercased,
/// whitespace collapsed, trailing sentence punctuation dropped, capped.
/// Two descriptions that differ only in case or whitespace normalize
/// identically.
pub fn normalize_description(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();
    out = RE_TAGS.replace_all(&out, "").to_string();
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    out = out.to_lowercase();
    out = RE_WS.replace_all(&out, " ").trim().to_string();
    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }
    if out.chars().count() > MAX_NORMALIZED_CHARS {
        out = out.chars().take(MAX_NORMALIZED_CHARS).collect();
    }
    out
}

/// Run every local check against the description. `recent_same_text` is the
/// store's count of complaints by the same reporter with an identical
/// normalized description inside the trailing window.
pub fn scan(description: &str, recent_same_text: u32) -> SpamScan {
    let normalized = normalize_description(description);
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let mut reasons = Vec::new();

    if normalized.chars().count() < MIN_DESCRIPTION_CHARS {
        reasons.push(format!(
            "description shorter than {MIN_DESCRIPTION_CHARS} characters"
        ));
    }
    if RE_URL.is_match(&normalized) {
        reasons.push("contains a URL-like token".to_string());
    }
    if has_char_run(description, CHAR_RUN_LIMIT) {
        reasons.push(format!("run of {CHAR_RUN_LIMIT}+ identical characters"));
    }
    if is_test_pattern(&tokens) {
        reasons.push("known low-effort test text".to_string());
    }
    if has_repeated_token(&tokens, TOKEN_REPEAT_LIMIT) {
        reasons.push("same token repeated".to_string());
    }
    if recent_same_text >= REPEAT_THRESHOLD {
        reasons.push(format!(
            "identical text filed {recent_same_text} times in the last {REPEAT_WINDOW_DAYS} days"
        ));
    }

    SpamScan {
        flagged: !reasons.is_empty(),
        reasons,
    }
}

// Runs are counted on the raw text so trailing "!!!!!!!" still registers;
// whitespace breaks a run.
fn has_char_run(text: &str, limit: usize) -> bool {
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for ch in text.chars() {
        if ch.is_whitespace() {
            prev = None;
            run = 0;
            continue;
        }
        if prev == Some(ch) {
            run += 1;
            if run >= limit {
                return true;
            }
        } else {
            prev = Some(ch);
            run = 1;
        }
    }
    false
}

fn is_test_pattern(tokens: &[&str]) -> bool {
    !tokens.is_empty()
        && tokens.iter().all(|t| {
            TEST_TOKENS.contains(t) || t.chars().all(|c| c.is_ascii_digit())
        })
}

fn has_repeated_token(tokens: &[&str], limit: usize) -> bool {
    let mut prev: Option<&str> = None;
    let mut run = 0usize;
    for &t in tokens {
        if prev == Some(t) {
            run += 1;
            if run >= limit {
                return true;
            }
        } else {
            prev = Some(t);
            run = 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_description_passes() {
        let scan = scan("Major pipe burst flooding the street", 0);
        assert!(!scan.flagged);
        assert!(scan.reasons.is_empty());
    }

    #[test]
    fn test_test_test_trips_repeated_token_and_test_pattern() {
        let scan = scan("test test test", 0);
        assert!(scan.flagged);
        let line = scan.reason_line();
        assert!(line.contains("test text"), "got: {line}");
        assert!(line.contains("repeated"), "got: {line}");
    }

    #[test]
    fn short_descriptions_are_flagged() {
        let scan = scan("bad", 0);
        assert!(scan.flagged);
        assert!(scan.reason_line().contains("shorter than 8"));
        // Whitespace padding does not rescue a short description.
        assert!(super::scan("  a    b  ", 0).flagged);
    }

    #[test]
    fn url_tokens_are_flagged() {
        assert!(scan("visit https://win-prizes.example now", 0).flagged);
        assert!(scan("go to www.fixmycity.com for details", 0).flagged);
        assert!(scan("click freestuff.ly to claim", 0).flagged);
        assert!(!scan("the road near st. mary circle is broken", 0).flagged);
    }

    #[test]
    fn character_runs_are_flagged_even_as_trailing_punctuation() {
        assert!(scan("aaaaaaah the noise from the pump house", 0).flagged);
        assert!(scan("fix this right now!!!!!!!", 0).flagged);
        // A run of spaces is formatting, not key-mashing.
        assert!(!scan("garbage pile        behind the market", 0).flagged);
    }

    #[test]
    fn reporter_repetition_from_store_count() {
        let clean = "overflowing bin at the corner of 4th main";
        assert!(!scan(clean, 1).flagged);
        let scan2 = scan(clean, 2);
        assert!(scan2.flagged);
        assert!(scan2.reason_line().contains("filed 2 times"));
    }

    #[test]
    fn normalization_is_case_and_whitespace_insensitive() {
        assert_eq!(
            normalize_description("  GARBAGE   pile\nnear gate!! "),
            normalize_description("garbage pile near gate")
        );
        assert_eq!(
            normalize_description("Hello,&nbsp;&nbsp; world!!!"),
            "hello, world"
        );
        assert_eq!(
            normalize_description("<b>Broken</b> streetlight"),
            "broken streetlight"
        );
    }

    #[test]
    fn numbers_count_as_filler_tokens() {
        assert!(scan("test 123", 0).flagged);
        assert!(!scan("pipe burst at 42 main street", 0).flagged);
    }
}
