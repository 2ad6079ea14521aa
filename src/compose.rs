//! Overlay composition
//!
//! Turns the buffer text plus the annotation set into an ordered,
//! non-overlapping sequence of plain and highlighted segments. The renderer
//! consumes these segments verbatim; concatenating their texts always
//! reproduces the buffer exactly.
//!
//! Overlap policy: annotations are processed in ascending start order and
//! each segment carries exactly one tier. When a later annotation overlaps
//! an earlier one, only its portion past the earlier annotation's end is
//! emitted. Deterministic, never drops text, never crashes.

use std::ops::Range;

use crate::annotation::{AnnotationSet, HighlightTier};
use crate::buffer::Buffer;

/// A run of buffer text with at most one highlight tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub tier: Option<HighlightTier>,
    /// Byte range of this segment within the buffer
    pub range: Range<usize>,
}

impl<'a> Segment<'a> {
    fn plain(buffer: &'a Buffer, range: Range<usize>) -> Self {
        Self {
            text: &buffer.as_str()[range.clone()],
            tier: None,
            range,
        }
    }

    fn styled(buffer: &'a Buffer, range: Range<usize>, tier: HighlightTier) -> Self {
        Self {
            text: &buffer.as_str()[range.clone()],
            tier: Some(tier),
            range,
        }
    }
}

/// Walk the buffer left to right, emitting an unstyled segment for every
/// gap and a styled segment for each annotation's `[start, end)`.
///
/// Annotation ranges are validated at rebuild time, but the buffer may have
/// shrunk since (stale set after an edit), so every range is clamped to the
/// current content before slicing.
pub fn compose<'a>(buffer: &'a Buffer, set: &AnnotationSet) -> Vec<Segment<'a>> {
    let len = buffer.len();
    let mut segments = Vec::new();
    let mut cursor = 0;

    for annotation in set.annotations() {
        let clamped = buffer.clamp_range(annotation.start.min(len)..annotation.end.min(len));
        // Fully covered by an earlier annotation
        if clamped.end <= cursor {
            continue;
        }
        let start = clamped.start.max(cursor);
        if start > cursor {
            segments.push(Segment::plain(buffer, cursor..start));
        }
        // Zero-width markers emit no text
        if clamped.end > start {
            segments.push(Segment::styled(buffer, start..clamped.end, annotation.tier));
        }
        cursor = clamped.end;
    }

    if cursor < len {
        segments.push(Segment::plain(buffer, cursor..len));
    }

    segments
}
