//! The editable text buffer
//!
//! A single UTF-8 string with byte-offset addressing. The buffer is the one
//! authoritative mutable text model: every other representation (highlight
//! segments, annotation ranges, the rendered view) is derived from it and
//! recomputed after mutation. Each mutation bumps a revision counter so
//! derived state can tell which snapshot it was computed against.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    text: String,
    revision: u64,
    modified: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            text: text.to_string(),
            revision: 0,
            modified: false,
        }
    }

    /// Replace the entire content (explicit document load). Resets the
    /// modified flag; still bumps the revision since all derived ranges
    /// are invalid afterwards.
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.revision += 1;
        self.modified = false;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Monotonic counter identifying the current content snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Insert `text` at `offset` (must be a char boundary; clamped to the
    /// nearest one at or before `offset` otherwise).
    pub fn insert(&mut self, offset: usize, text: &str) {
        let offset = self.floor_char_boundary(offset);
        self.text.insert_str(offset, text);
        self.touch();
    }

    /// Delete the bytes in `range` (endpoints snapped to char boundaries).
    pub fn delete(&mut self, range: Range<usize>) {
        let range = self.clamp_range(range);
        self.text.replace_range(range, "");
        self.touch();
    }

    /// Splice: replace the bytes in `range` with `replacement`.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        let range = self.clamp_range(range);
        self.text.replace_range(range, replacement);
        self.touch();
    }

    /// Replace the content of the 0-based line `line` (excluding its
    /// newline). Returns false if the line does not exist.
    pub fn replace_line(&mut self, line: usize, replacement: &str) -> bool {
        let Some(start) = self.line_start_offset(line) else {
            return false;
        };
        let end = start
            + self.text[start..]
                .find('\n')
                .unwrap_or(self.text.len() - start);
        self.text.replace_range(start..end, replacement);
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.modified = true;
    }

    /// Number of lines. An empty buffer has one (empty) line, matching the
    /// `split('\n')` view used by line-based suggestion fallback.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Byte offset of the start of the 0-based line `line`: the lengths of
    /// all preceding lines plus one newline each.
    pub fn line_start_offset(&self, line: usize) -> Option<usize> {
        let mut offset = 0;
        for (idx, content) in self.text.split('\n').enumerate() {
            if idx == line {
                return Some(offset);
            }
            offset += content.len() + 1;
        }
        None
    }

    /// Content of the 0-based line `line`, without its newline.
    pub fn line_slice(&self, line: usize) -> Option<&str> {
        self.text.split('\n').nth(line)
    }

    /// 0-based line containing `offset` (clamped to the buffer end).
    pub fn line_of_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.text.as_bytes()[..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
    }

    /// Largest char boundary less than or equal to `offset`.
    pub fn floor_char_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    /// Snap `range` to char boundaries inside the buffer.
    pub fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let start = self.floor_char_boundary(range.start);
        let end = self.floor_char_boundary(range.end.max(range.start));
        start..end.max(start)
    }

    /// Next grapheme boundary after `offset` (for caret movement).
    pub fn next_grapheme_boundary(&self, offset: usize) -> usize {
        let offset = self.floor_char_boundary(offset);
        self.text[offset..]
            .graphemes(true)
            .next()
            .map(|g| offset + g.len())
            .unwrap_or(offset)
    }

    /// Previous grapheme boundary before `offset`.
    pub fn prev_grapheme_boundary(&self, offset: usize) -> usize {
        let offset = self.floor_char_boundary(offset);
        self.text[..offset]
            .graphemes(true)
            .next_back()
            .map(|g| offset - g.len())
            .unwrap_or(0)
    }

    /// Word count of the whole buffer, used as save metadata.
    pub fn word_count(&self) -> usize {
        self.text.unicode_words().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_delete_bump_revision() {
        let mut buffer = Buffer::from_str("hello");
        assert_eq!(buffer.revision(), 0);
        assert!(!buffer.is_modified());

        buffer.insert(5, " world");
        assert_eq!(buffer.as_str(), "hello world");
        assert_eq!(buffer.revision(), 1);
        assert!(buffer.is_modified());

        buffer.delete(5..11);
        assert_eq!(buffer.as_str(), "hello");
        assert_eq!(buffer.revision(), 2);
    }

    #[test]
    fn test_replace_range_is_exact_splice() {
        let mut buffer = Buffer::from_str("He was very cold.");
        buffer.replace_range(7..16, "freezing");
        assert_eq!(buffer.as_str(), "He was freezing.");
    }

    #[test]
    fn test_line_start_offsets() {
        let buffer = Buffer::from_str("hello\nworld\ntest");
        assert_eq!(buffer.line_start_offset(0), Some(0));
        assert_eq!(buffer.line_start_offset(1), Some(6));
        assert_eq!(buffer.line_start_offset(2), Some(12));
        assert_eq!(buffer.line_start_offset(3), None);
    }

    #[test]
    fn test_line_of_offset() {
        let buffer = Buffer::from_str("hello\nworld\ntest");
        assert_eq!(buffer.line_of_offset(0), 0);
        assert_eq!(buffer.line_of_offset(5), 0);
        assert_eq!(buffer.line_of_offset(6), 1);
        assert_eq!(buffer.line_of_offset(12), 2);
        // Clamped past the end
        assert_eq!(buffer.line_of_offset(1000), 2);
    }

    #[test]
    fn test_replace_line_keeps_other_lines() {
        let mut buffer = Buffer::from_str("one\ntwo\nthree");
        assert!(buffer.replace_line(1, "TWO"));
        assert_eq!(buffer.as_str(), "one\nTWO\nthree");
        assert!(!buffer.replace_line(3, "nope"));
        assert_eq!(buffer.as_str(), "one\nTWO\nthree");
    }

    #[test]
    fn test_replace_last_line_without_newline() {
        let mut buffer = Buffer::from_str("one\ntwo");
        assert!(buffer.replace_line(1, "2"));
        assert_eq!(buffer.as_str(), "one\n2");
    }

    #[test]
    fn test_grapheme_boundaries_multibyte() {
        let buffer = Buffer::from_str("aé✓b");
        let mut offset = 0;
        let mut steps = Vec::new();
        loop {
            let next = buffer.next_grapheme_boundary(offset);
            if next == offset {
                break;
            }
            steps.push(next);
            offset = next;
        }
        assert_eq!(steps, vec![1, 3, 6, 7]);
        assert_eq!(buffer.prev_grapheme_boundary(6), 3);
        assert_eq!(buffer.prev_grapheme_boundary(1), 0);
        assert_eq!(buffer.prev_grapheme_boundary(0), 0);
    }

    #[test]
    fn test_clamp_range_snaps_to_char_boundaries() {
        let buffer = Buffer::from_str("aé b");
        // Offset 2 is inside the two-byte 'é'
        assert_eq!(buffer.clamp_range(2..100), 1..5);
        assert_eq!(buffer.clamp_range(3..2), 3..3);
    }

    #[test]
    fn test_word_count() {
        let buffer = Buffer::from_str("He was very cold.\nIt was late.");
        assert_eq!(buffer.word_count(), 8);
        assert_eq!(Buffer::new().word_count(), 0);
    }

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buffer = Buffer::new();
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.line_start_offset(0), Some(0));
        assert_eq!(buffer.line_slice(0), Some(""));
    }
}
