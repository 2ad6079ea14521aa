//! Model tier selection
//!
//! Routes a free-text request to one of three service-cost tiers by keyword
//! match. Heavy-tier keywords are checked before medium-tier ones so an
//! explicit large-scope request ("completely rewrite this scene") is never
//! downgraded just because it also contains a medium-tier word like
//! "improve". No match falls through to the cheap tier.

use once_cell::sync::Lazy;
use regex::Regex;

/// Service-cost class for a natural-language request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Cheap,
    Medium,
    Heavy,
}

impl ModelTier {
    pub fn label(self) -> &'static str {
        match self {
            ModelTier::Cheap => "cheap",
            ModelTier::Medium => "medium",
            ModelTier::Heavy => "heavy",
        }
    }
}

static HEAVY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(rewrite|rework|overhaul|restructure|reimagine|from scratch|start over)\b")
        .unwrap()
});

static MEDIUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(fix|improve|polish|tighten|revise|edit|grammar|clarify|smooth)\b").unwrap()
});

/// Case-insensitive, word-boundary keyword match; heavy keywords first,
/// medium second, first match wins, default cheap.
pub fn select_tier(prompt: &str) -> ModelTier {
    if HEAVY_RE.is_match(prompt) {
        ModelTier::Heavy
    } else if MEDIUM_RE.is_match(prompt) {
        ModelTier::Medium
    } else {
        ModelTier::Cheap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_scope_request_is_heavy() {
        assert_eq!(
            select_tier("Please completely rewrite this scene"),
            ModelTier::Heavy
        );
    }

    #[test]
    fn test_editing_request_is_medium() {
        assert_eq!(select_tier("Can you fix the grammar"), ModelTier::Medium);
    }

    #[test]
    fn test_plain_question_is_cheap() {
        assert_eq!(select_tier("What does this word mean"), ModelTier::Cheap);
    }

    #[test]
    fn test_heavy_keyword_beats_medium_keyword() {
        // "fix" alone would be medium, but "rewrite" takes priority
        assert_eq!(select_tier("fix this rewrite"), ModelTier::Heavy);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(select_tier("REWRITE it all"), ModelTier::Heavy);
        assert_eq!(select_tier("Improve the pacing"), ModelTier::Medium);
    }

    #[test]
    fn test_keywords_require_word_boundaries() {
        // "prefix" contains "fix" but not as a word
        assert_eq!(select_tier("add a prefix to the name"), ModelTier::Cheap);
        // "reworked" is not the word "rework"
        assert_eq!(select_tier("the reworked draft"), ModelTier::Cheap);
    }

    #[test]
    fn test_empty_prompt_is_cheap() {
        assert_eq!(select_tier(""), ModelTier::Cheap);
    }
}
