//! Annotation range index
//!
//! Findings arrive from the analysis provider as two flat lists: style
//! issues (with byte ranges into the submitted text) and AI edit
//! suggestions (keyed to 1-based line numbers). This module reconciles both
//! into a single set of annotations anchored to `[start, end)` byte ranges
//! of the current buffer snapshot, ready for composition and caret lookup.
//!
//! Ranges are offsets into a specific buffer revision, not stable
//! identifiers: the set records the revision it was built against, and a
//! new analysis cycle replaces the whole set.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::buffer::Buffer;

/// Issue severity as reported by the analysis provider. Wire values outside
/// the known three parse as `Unknown` and render in the neutral tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn tier(self) -> HighlightTier {
        match self {
            Severity::Error => HighlightTier::Error,
            Severity::Warning => HighlightTier::Warning,
            Severity::Info => HighlightTier::Info,
            Severity::Unknown => HighlightTier::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Unknown => "NOTE",
        }
    }
}

/// Visual tier of a highlight segment. Issues map through their severity;
/// suggestions always use the one suggestion tier regardless of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightTier {
    Error,
    Warning,
    Info,
    Neutral,
    Suggestion,
}

/// A style issue produced by the analysis provider. Read-only to the
/// overlay core except for removal ("ignore").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: String,
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub range: Option<Range<usize>>,
}

/// An AI-suggested replacement, keyed to a 1-based source line. `range` is
/// derived at rebuild time by locating `old_text` within that line; when it
/// stays `None` only line-based application is possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub source_line: usize,
    pub old_text: String,
    pub new_text: String,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub range: Option<Range<usize>>,
}

/// Which raw finding an annotation points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Index into the issue list
    Issue(usize),
    /// Index into the suggestion list
    Suggestion(usize),
}

/// A renderable marker: a byte range of the buffer plus its visual tier.
/// Invariant: `start <= end <= buffer.len()` at rebuild time; `start == end`
/// is a tolerated zero-width marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub kind: AnnotationKind,
    pub tier: HighlightTier,
}

impl Annotation {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The current set of findings and their renderable annotations.
///
/// Built wholesale per analysis cycle; individual findings leave the set
/// when ignored or applied. Findings without a usable range stay in the raw
/// lists (for line-based fallback) but are excluded from the renderable
/// annotations.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    issues: Vec<Issue>,
    suggestions: Vec<Suggestion>,
    /// Renderable annotations, sorted by ascending start, ties by smaller end
    annotations: Vec<Annotation>,
    /// Buffer revision the ranges were computed against
    revision: u64,
}

impl AnnotationSet {
    /// Build the index from raw findings against the current buffer.
    ///
    /// Suggestion ranges are (re)computed here from `old_text` and
    /// `source_line`. Issue ranges outside the buffer or inverted are
    /// excluded from rendering but the issue itself is kept.
    pub fn rebuild(issues: Vec<Issue>, mut suggestions: Vec<Suggestion>, buffer: &Buffer) -> Self {
        for suggestion in &mut suggestions {
            suggestion.range =
                locate_in_line(buffer, suggestion.source_line, &suggestion.old_text);
        }

        let mut annotations = Vec::new();
        for (idx, issue) in issues.iter().enumerate() {
            match validated(issue.range.clone(), buffer) {
                Some(range) => annotations.push(Annotation {
                    start: range.start,
                    end: range.end,
                    kind: AnnotationKind::Issue(idx),
                    tier: issue.severity.tier(),
                }),
                None => {
                    if issue.range.is_some() {
                        tracing::warn!(
                            "issue '{}' has range {:?} outside buffer of {} bytes, not rendering",
                            issue.kind,
                            issue.range,
                            buffer.len()
                        );
                    }
                }
            }
        }
        for (idx, suggestion) in suggestions.iter().enumerate() {
            if let Some(range) = validated(suggestion.range.clone(), buffer) {
                annotations.push(Annotation {
                    start: range.start,
                    end: range.end,
                    kind: AnnotationKind::Suggestion(idx),
                    tier: HighlightTier::Suggestion,
                });
            }
        }

        annotations.sort_by_key(|a| (a.start, a.end));

        Self {
            issues,
            suggestions,
            annotations,
            revision: buffer.revision(),
        }
    }

    /// First annotation (ascending start, ties by smaller end, i.e. most
    /// specific match first) whose `[start, end]` contains `offset`
    /// inclusive of both endpoints. Inclusive end supports a caret sitting
    /// just past the last highlighted character.
    pub fn lookup(&self, offset: usize) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.start <= offset && offset <= a.end)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn issue(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }

    pub fn suggestion(&self, index: usize) -> Option<&Suggestion> {
        self.suggestions.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Total renderable annotation count (used for render re-sync).
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Buffer revision the ranges were computed against.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Issue counts by severity: (errors, warnings, infos + unknown).
    pub fn severity_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for issue in &self.issues {
            match issue.severity {
                Severity::Error => counts.0 += 1,
                Severity::Warning => counts.1 += 1,
                Severity::Info | Severity::Unknown => counts.2 += 1,
            }
        }
        counts
    }

    /// Drop an issue ("ignore"). Its annotation disappears; other
    /// annotations keep their ranges.
    pub fn remove_issue(&mut self, index: usize) {
        if index >= self.issues.len() {
            return;
        }
        self.issues.remove(index);
        self.annotations.retain(|a| a.kind != AnnotationKind::Issue(index));
        for annotation in &mut self.annotations {
            if let AnnotationKind::Issue(i) = &mut annotation.kind {
                if *i > index {
                    *i -= 1;
                }
            }
        }
    }

    /// Drop a suggestion (applied or rejected; it cannot be re-applied).
    pub fn remove_suggestion(&mut self, index: usize) {
        if index >= self.suggestions.len() {
            return;
        }
        self.suggestions.remove(index);
        self.annotations
            .retain(|a| a.kind != AnnotationKind::Suggestion(index));
        for annotation in &mut self.annotations {
            if let AnnotationKind::Suggestion(i) = &mut annotation.kind {
                if *i > index {
                    *i -= 1;
                }
            }
        }
    }
}

/// A range is usable only if it is ordered and inside the buffer; endpoints
/// are snapped down to char boundaries so slicing can never panic.
fn validated(range: Option<Range<usize>>, buffer: &Buffer) -> Option<Range<usize>> {
    let range = range?;
    if range.start > range.end || range.end > buffer.len() {
        return None;
    }
    let start = buffer.floor_char_boundary(range.start);
    let end = buffer.floor_char_boundary(range.end).max(start);
    Some(start..end)
}

/// Locate `old_text` within the content of the 1-based `source_line`:
/// the line's start offset is the sum of the lengths of preceding lines
/// plus one newline each, and the match is the first occurrence within
/// that line only.
pub fn locate_in_line(buffer: &Buffer, source_line: usize, old_text: &str) -> Option<Range<usize>> {
    if source_line == 0 {
        return None;
    }
    let line = source_line - 1;
    let line_start = buffer.line_start_offset(line)?;
    let content = buffer.line_slice(line)?;
    let found = content.find(old_text)?;
    let start = line_start + found;
    Some(start..start + old_text.len())
}
