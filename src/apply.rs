//! Applying and rejecting suggestions
//!
//! A suggestion with a computed range is applied as a direct splice of that
//! exact range; the range was fixed at rebuild time against a specific
//! buffer snapshot and is never re-searched at apply time. Without a range,
//! application falls back to replacing the whole 1-based source line. In
//! both cases the suggestion leaves the active set and cannot be re-applied.

use crate::annotation::AnnotationSet;
use crate::buffer::Buffer;

/// How a suggestion application landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Spliced at the recorded byte range
    Range,
    /// Replaced the whole source line (no range was computed)
    Line,
    /// Line-fallback with an out-of-range line number: buffer untouched
    OutOfRange,
    /// No suggestion at that index
    Missing,
}

/// Apply the suggestion at `index` and remove it from the set.
///
/// The range path is character-exact: `buffer[start..end]` becomes
/// `new_text` regardless of what currently sits there. If the buffer has
/// been edited since the set was built the splice may land on shifted
/// content (the stale-splice limitation); that is logged but not blocked —
/// re-running analysis refreshes the ranges.
pub fn apply_suggestion(buffer: &mut Buffer, set: &mut AnnotationSet, index: usize) -> Applied {
    let Some(suggestion) = set.suggestion(index) else {
        return Applied::Missing;
    };
    let range = suggestion.range.clone();
    let source_line = suggestion.source_line;
    let new_text = suggestion.new_text.clone();

    let outcome = match range {
        Some(range) => {
            if set.revision() != buffer.revision() {
                tracing::warn!(
                    "applying suggestion against buffer revision {} with ranges from revision {}",
                    buffer.revision(),
                    set.revision()
                );
            }
            buffer.replace_range(range, &new_text);
            Applied::Range
        }
        None => {
            // 1-based line index into the buffer's line list
            if source_line >= 1 && buffer.replace_line(source_line - 1, &new_text) {
                Applied::Line
            } else {
                tracing::warn!(
                    "suggestion line {} out of range ({} lines), nothing applied",
                    source_line,
                    buffer.line_count()
                );
                Applied::OutOfRange
            }
        }
    };

    set.remove_suggestion(index);
    outcome
}

/// Drop the suggestion at `index` without touching the buffer.
pub fn reject_suggestion(set: &mut AnnotationSet, index: usize) {
    set.remove_suggestion(index);
}

/// Drop the issue at `index` ("ignore") without touching the buffer.
pub fn ignore_issue(set: &mut AnnotationSet, index: usize) {
    set.remove_issue(index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Suggestion;

    fn ranged_set(buffer: &Buffer, line: usize, old: &str, new: &str) -> AnnotationSet {
        AnnotationSet::rebuild(
            vec![],
            vec![Suggestion {
                source_line: line,
                old_text: old.to_string(),
                new_text: new.to_string(),
                rationale: None,
                range: None,
            }],
            buffer,
        )
    }

    #[test]
    fn test_apply_with_range_is_exact_splice() {
        let mut buffer = Buffer::from_str("He was very cold. It was late.");
        let mut set = ranged_set(&buffer, 1, "very cold", "freezing");
        assert_eq!(set.suggestion(0).unwrap().range, Some(7..16));

        let outcome = apply_suggestion(&mut buffer, &mut set, 0);

        assert_eq!(outcome, Applied::Range);
        assert_eq!(buffer.as_str(), "He was freezing. It was late.");
        assert!(set.suggestions().is_empty(), "suggestion consumed");
        assert!(set.annotations().is_empty());
    }

    #[test]
    fn test_apply_line_fallback_replaces_only_that_line() {
        let mut buffer = Buffer::from_str("one\ntwo\nthree");
        let mut set = ranged_set(&buffer, 2, "not in the line", "TWO");
        assert_eq!(set.suggestion(0).unwrap().range, None);

        let outcome = apply_suggestion(&mut buffer, &mut set, 0);

        assert_eq!(outcome, Applied::Line);
        assert_eq!(buffer.as_str(), "one\nTWO\nthree");
        assert!(set.suggestions().is_empty());
    }

    #[test]
    fn test_apply_out_of_range_line_is_noop() {
        let mut buffer = Buffer::from_str("only line");
        let mut set = ranged_set(&buffer, 7, "missing", "x");

        let outcome = apply_suggestion(&mut buffer, &mut set, 0);

        assert_eq!(outcome, Applied::OutOfRange);
        assert_eq!(buffer.as_str(), "only line");
        // Consumed even though nothing changed
        assert!(set.suggestions().is_empty());
    }

    #[test]
    fn test_apply_line_zero_is_noop() {
        let mut buffer = Buffer::from_str("only line");
        let mut set = ranged_set(&buffer, 0, "missing", "x");
        assert_eq!(apply_suggestion(&mut buffer, &mut set, 0), Applied::OutOfRange);
        assert_eq!(buffer.as_str(), "only line");
    }

    #[test]
    fn test_reject_leaves_buffer_unchanged() {
        let buffer = Buffer::from_str("He was very cold.");
        let mut set = ranged_set(&buffer, 1, "very cold", "freezing");

        reject_suggestion(&mut set, 0);

        assert_eq!(buffer.as_str(), "He was very cold.");
        assert!(set.suggestions().is_empty());
        assert!(set.annotations().is_empty());
    }

    #[test]
    fn test_ignore_issue_removes_it() {
        use crate::annotation::{Issue, Severity};
        let buffer = Buffer::from_str("he was very cold");
        let mut set = AnnotationSet::rebuild(
            vec![Issue {
                kind: "filler".to_string(),
                severity: Severity::Warning,
                message: "filler word".to_string(),
                range: Some(7..11),
            }],
            vec![],
            &buffer,
        );

        ignore_issue(&mut set, 0);
        assert!(set.issues().is_empty());
        assert!(set.annotations().is_empty());
    }

    #[test]
    fn test_apply_missing_index() {
        let mut buffer = Buffer::from_str("text");
        let mut set = AnnotationSet::rebuild(vec![], vec![], &buffer);
        assert_eq!(apply_suggestion(&mut buffer, &mut set, 3), Applied::Missing);
    }
}
