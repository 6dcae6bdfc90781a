//! Learning subject extraction.
//!
//! Best-effort heuristic over free-form prompt text. An ordered table of
//! intent patterns is tried first (first match wins, not longest); a fixed
//! list of known academic subjects is the fallback. False positives and
//! negatives are acceptable by design.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered learning-intent patterns.
///
/// Each pattern captures a candidate span up to a terminating cue ("step by
/// step", "basics", "fundamentals", "from scratch"), a period, or end of
/// input. Priority is table order: the first pattern that matches anywhere
/// in the prompt supplies the candidate, even if a later pattern would match
/// earlier in the text.
static INTENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"learn(?:ing)?\s+(?:about\s+)?([a-z0-9\s\-_]+?)(?:\s+(?:step by step|basics|fundamentals|from scratch)|\.|$)",
        )
        .ok(),
        Regex::new(
            r"study(?:ing)?\s+([a-z0-9\s\-_]+?)(?:\s+(?:step by step|basics|fundamentals|from scratch)|\.|$)",
        )
        .ok(),
        Regex::new(
            r"help me (?:with|understand)\s+([a-z0-9\s\-_]+?)(?:\s+(?:step by step|basics|fundamentals|from scratch)|\.|$)",
        )
        .ok(),
        Regex::new(
            r"teach me\s+(?:about\s+)?([a-z0-9\s\-_]+?)(?:\s+(?:step by step|basics|fundamentals|from scratch)|\.|$)",
        )
        .ok(),
        Regex::new(r"explain\s+([a-z0-9\s\-_]+?)\s+(?:to me|concepts?|basics?|fundamentals?)").ok(),
        Regex::new(r"(?:what is|introduction to)\s+([a-z0-9\s\-_]+?)(?:\?|\.|$)").ok(),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Determiner and qualifier words stripped from candidates.
static NOISE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:the|a|an|some|basic|basics|fundamental|fundamentals)\b")
        .ok()
        .unwrap_or_else(|| Regex::new(r"^$").ok().unwrap())
});

/// Known academic subjects for substring fallback. Order is the tie-break.
static FALLBACK_SUBJECTS: &[&str] = &[
    "machine learning",
    "deep learning",
    "neural networks",
    "artificial intelligence",
    "calculus",
    "linear algebra",
    "statistics",
    "probability",
    "physics",
    "chemistry",
    "biology",
    "discrete mathematics",
    "discrete math",
    "algorithms",
    "data structures",
    "computer science",
    "programming",
    "python",
    "javascript",
    "economics",
    "microeconomics",
    "macroeconomics",
    "organic chemistry",
    "biochemistry",
    "molecular biology",
];

/// Extracts a learning subject from prompt text.
///
/// Returns a normalized lowercase subject, or `None` when no intent pattern
/// matches and no fallback subject occurs in the prompt.
#[must_use]
pub fn extract_subject(prompt: &str) -> Option<String> {
    let lowered = prompt.to_lowercase();

    for pattern in INTENT_PATTERNS.iter() {
        if let Some(candidate) = pattern.captures(&lowered).and_then(|c| c.get(1)) {
            let cleaned = clean_candidate(candidate.as_str());
            // Anything this short is a determiner remnant, not a subject.
            if cleaned.len() > 2 {
                return Some(cleaned);
            }
        }
    }

    FALLBACK_SUBJECTS
        .iter()
        .find(|subject| lowered.contains(*subject))
        .map(|subject| (*subject).to_string())
}

/// Strips noise words and collapses whitespace in a captured candidate.
fn clean_candidate(candidate: &str) -> String {
    let stripped = NOISE_WORDS.replace_all(candidate.trim(), "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
