//! The editing surface
//!
//! Two perfectly aligned passes over the identical buffer content: a styled
//! surface (highlight backgrounds and underlines derived from the overlay
//! segments) painted first, and the interactive surface (selection overlay
//! and the hardware caret) projected on top. Both passes derive cell
//! positions from the same layout helpers — `visible_window` for the
//! horizontal slice and `display_width` for column projection — so a byte
//! offset lands on the same cell in either pass.
//!
//! Scroll state is one pair of fields shared by both passes; whatever
//! scrolls the interactive surface moves the styled surface in the same
//! frame. When the annotation count changes, the view re-synchronizes by
//! clamping scroll against the new render.

use std::ops::Range;

use ratatui::layout::{Position, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use crate::buffer::Buffer;
use crate::compose::Segment;
use crate::view::theme::Theme;

#[derive(Debug, Default)]
pub struct EditorView {
    /// Caret byte offset into the buffer
    pub caret: usize,
    /// Selected byte range, if any (start <= end)
    pub selection: Option<Range<usize>>,
    /// Whether the editing surface has input focus
    pub focused: bool,
    /// First visible buffer line — the single scroll truth for both passes
    pub scroll_top: usize,
    /// First visible display column
    pub scroll_left: usize,

    last_annotation_count: usize,
    last_height: u16,
    last_width: u16,
}

/// Display width of a string in terminal cells.
pub fn display_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Byte range of `line` that is visible in a window of `width` cells
/// starting at display column `left`. Both passes use this, so they can
/// never disagree about what is on screen.
fn visible_window(line: &str, left: usize, width: usize) -> Range<usize> {
    let mut start = line.len();
    let mut acc = 0usize;
    for (idx, ch) in line.char_indices() {
        if acc >= left {
            start = idx;
            break;
        }
        acc += ch.width().unwrap_or(0);
    }

    let mut end = line.len();
    let mut used = 0usize;
    for (idx, ch) in line[start..].char_indices() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            end = start + idx;
            break;
        }
        used += w;
    }
    start..end
}

impl EditorView {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Self::default()
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Set the selection to exactly `range` and park the caret at its start.
    pub fn set_selection(&mut self, range: Range<usize>) {
        self.caret = range.start;
        self.selection = Some(range);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn page_height(&self) -> usize {
        self.last_height.max(1) as usize
    }

    /// Re-synchronize after the renderable annotation count changed: a new
    /// overlay render may alter what fits, so clamp scroll to the content.
    pub fn sync_annotations(&mut self, count: usize, buffer: &Buffer) {
        if count != self.last_annotation_count {
            self.last_annotation_count = count;
            self.scroll_top = self.scroll_top.min(buffer.line_count().saturating_sub(1));
        }
    }

    /// 0-based line and absolute display column of the caret.
    pub fn caret_line_col(&self, buffer: &Buffer) -> (usize, usize) {
        let line = buffer.line_of_offset(self.caret);
        let start = buffer.line_start_offset(line).unwrap_or(0);
        let col = display_width(&buffer.as_str()[start..self.caret.max(start).min(buffer.len())]);
        (line, col)
    }

    /// Byte offset at (or before) display column `col` of `line`.
    fn offset_at_col(buffer: &Buffer, line: usize, col: usize) -> usize {
        let start = buffer.line_start_offset(line).unwrap_or(0);
        let content = buffer.line_slice(line).unwrap_or("");
        let mut acc = 0usize;
        for (idx, ch) in content.char_indices() {
            if acc >= col {
                return start + idx;
            }
            acc += ch.width().unwrap_or(0);
        }
        start + content.len()
    }

    /// Scroll so the caret stays visible, keeping `margin` rows of context
    /// where possible. Both passes read the resulting scroll state.
    pub fn ensure_caret_visible(&mut self, buffer: &Buffer, margin: usize) {
        let (line, col) = self.caret_line_col(buffer);
        let height = self.last_height.max(1) as usize;
        let width = self.last_width.max(1) as usize;

        if line < self.scroll_top + margin {
            self.scroll_top = line.saturating_sub(margin);
        } else if line + margin >= self.scroll_top + height {
            self.scroll_top = (line + margin + 1).saturating_sub(height);
        }

        if col < self.scroll_left {
            self.scroll_left = col;
        } else if col >= self.scroll_left + width {
            self.scroll_left = col + 1 - width;
        }
    }

    // --- caret movement ---

    pub fn move_left(&mut self, buffer: &Buffer) {
        self.caret = buffer.prev_grapheme_boundary(self.caret);
        self.selection = None;
    }

    pub fn move_right(&mut self, buffer: &Buffer) {
        self.caret = buffer.next_grapheme_boundary(self.caret);
        self.selection = None;
    }

    pub fn move_up(&mut self, buffer: &Buffer) {
        let (line, col) = self.caret_line_col(buffer);
        self.caret = if line == 0 {
            0
        } else {
            Self::offset_at_col(buffer, line - 1, col)
        };
        self.selection = None;
    }

    pub fn move_down(&mut self, buffer: &Buffer) {
        let (line, col) = self.caret_line_col(buffer);
        self.caret = if line + 1 >= buffer.line_count() {
            buffer.len()
        } else {
            Self::offset_at_col(buffer, line + 1, col)
        };
        self.selection = None;
    }

    pub fn move_line_start(&mut self, buffer: &Buffer) {
        let (line, _) = self.caret_line_col(buffer);
        self.caret = buffer.line_start_offset(line).unwrap_or(0);
        self.selection = None;
    }

    pub fn move_line_end(&mut self, buffer: &Buffer) {
        let (line, _) = self.caret_line_col(buffer);
        let start = buffer.line_start_offset(line).unwrap_or(0);
        self.caret = start + buffer.line_slice(line).map(|l| l.len()).unwrap_or(0);
        self.selection = None;
    }

    pub fn move_page_up(&mut self, buffer: &Buffer) {
        for _ in 0..self.page_height() {
            self.move_up(buffer);
        }
    }

    pub fn move_page_down(&mut self, buffer: &Buffer) {
        for _ in 0..self.page_height() {
            self.move_down(buffer);
        }
    }

    // --- editing (the only buffer writers besides suggestion application) ---

    pub fn insert_char(&mut self, buffer: &mut Buffer, c: char) {
        self.delete_selection(buffer);
        let mut tmp = [0u8; 4];
        let s = c.encode_utf8(&mut tmp);
        buffer.insert(self.caret, s);
        self.caret += s.len();
    }

    pub fn insert_newline(&mut self, buffer: &mut Buffer) {
        self.delete_selection(buffer);
        buffer.insert(self.caret, "\n");
        self.caret += 1;
    }

    pub fn backspace(&mut self, buffer: &mut Buffer) {
        if self.delete_selection(buffer) {
            return;
        }
        let prev = buffer.prev_grapheme_boundary(self.caret);
        if prev < self.caret {
            buffer.delete(prev..self.caret);
            self.caret = prev;
        }
    }

    pub fn delete_forward(&mut self, buffer: &mut Buffer) {
        if self.delete_selection(buffer) {
            return;
        }
        let next = buffer.next_grapheme_boundary(self.caret);
        if next > self.caret {
            buffer.delete(self.caret..next);
        }
    }

    fn delete_selection(&mut self, buffer: &mut Buffer) -> bool {
        match self.selection.take() {
            Some(selection) if !selection.is_empty() => {
                self.caret = selection.start;
                buffer.delete(selection);
                true
            }
            _ => false,
        }
    }

    /// Buffer byte offset under a screen cell, for mouse interaction.
    /// Columns past the end of a line map to the line end.
    pub fn offset_at_cell(&self, buffer: &Buffer, area: Rect, x: u16, y: u16) -> Option<usize> {
        if !area.contains(Position::new(x, y)) {
            return None;
        }
        let line = self.scroll_top + (y - area.y) as usize;
        if line >= buffer.line_count() {
            return Some(buffer.len());
        }
        let col = self.scroll_left + (x - area.x) as usize;
        Some(Self::offset_at_col(buffer, line, col))
    }

    /// Render both surfaces. The styled pass paints highlight segments, the
    /// interactive pass projects selection and caret over it.
    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        buffer: &Buffer,
        segments: &[Segment],
        theme: &Theme,
    ) {
        self.last_height = area.height;
        self.last_width = area.width;
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Pass 1: the styled surface.
        let mut rows: Vec<Line> = Vec::with_capacity(area.height as usize);
        let mut line_start = 0usize;
        let text = buffer.as_str();
        for (line_idx, content) in buffer.lines().enumerate() {
            if line_idx >= self.scroll_top + area.height as usize {
                break;
            }
            if line_idx >= self.scroll_top {
                let window = visible_window(content, self.scroll_left, area.width as usize);
                let window = line_start + window.start..line_start + window.end;
                let mut spans = Vec::new();
                for segment in segments {
                    let start = segment.range.start.max(window.start);
                    let end = segment.range.end.min(window.end);
                    if start < end {
                        let style = match segment.tier {
                            Some(tier) => theme.tier_style(tier),
                            None => theme.base_style(),
                        };
                        spans.push(Span::styled(&text[start..end], style));
                    }
                }
                rows.push(Line::from(spans));
            }
            line_start += content.len() + 1;
        }
        frame.render_widget(
            Paragraph::new(Text::from(rows)).style(theme.base_style()),
            area,
        );

        // Pass 2: the interactive surface, projected with the same layout.
        if let Some(selection) = self.selection.clone() {
            self.paint_selection(frame, area, buffer, selection, theme);
        }

        if self.focused {
            let (line, col) = self.caret_line_col(buffer);
            let row_visible =
                line >= self.scroll_top && line < self.scroll_top + area.height as usize;
            let col_visible =
                col >= self.scroll_left && col < self.scroll_left + area.width as usize;
            if row_visible && col_visible {
                frame.set_cursor_position(Position::new(
                    area.x + (col - self.scroll_left) as u16,
                    area.y + (line - self.scroll_top) as u16,
                ));
            }
        }
    }

    fn paint_selection(
        &self,
        frame: &mut Frame,
        area: Rect,
        buffer: &Buffer,
        selection: Range<usize>,
        theme: &Theme,
    ) {
        let mut line_start = 0usize;
        for (line_idx, content) in buffer.lines().enumerate() {
            if line_idx >= self.scroll_top + area.height as usize {
                break;
            }
            let line_end = line_start + content.len();
            if line_idx >= self.scroll_top {
                let window = visible_window(content, self.scroll_left, area.width as usize);
                let win_abs = line_start + window.start..line_start + window.end;
                let start = selection.start.max(win_abs.start);
                let end = selection.end.min(win_abs.end);
                if start < end {
                    // Columns relative to the window origin, via the shared
                    // width projection
                    let x0 = display_width(&buffer.as_str()[win_abs.start..start]);
                    let x1 = x0 + display_width(&buffer.as_str()[start..end]);
                    let rect = Rect::new(
                        area.x + x0 as u16,
                        area.y + (line_idx - self.scroll_top) as u16,
                        (x1 - x0) as u16,
                        1,
                    );
                    frame
                        .buffer_mut()
                        .set_style(rect.intersection(area), theme.selection_style());
                }
            }
            line_start = line_end + 1;
            if line_start > selection.end {
                break;
            }
        }
    }
}
