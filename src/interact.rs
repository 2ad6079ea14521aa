//! Caret/annotation interaction
//!
//! Maps a caret or click position to the annotation under it and manages
//! the single detail popover. The popover is a small state machine:
//! `Closed` or `Open(annotation)`; selecting a second annotation replaces
//! the first, never stacks.

use crate::annotation::{Annotation, AnnotationSet};
use crate::buffer::Buffer;
use crate::view::editor::EditorView;

/// At most one annotation is open for inspection at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveDetail {
    #[default]
    Closed,
    Open(Annotation),
}

#[derive(Debug, Default)]
pub struct InteractionController {
    detail: ActiveDetail,
}

/// Rows kept above a jumped-to line: the target line lands two rows below
/// the top of the visible area.
const JUMP_CONTEXT_ROWS: usize = 2;

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Annotation> {
        match &self.detail {
            ActiveDetail::Closed => None,
            ActiveDetail::Open(annotation) => Some(annotation),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.detail, ActiveDetail::Closed)
    }

    pub fn dismiss(&mut self) {
        self.detail = ActiveDetail::Closed;
    }

    /// A caret/click landed at `offset`: open the detail for the annotation
    /// containing it, or close the current one if the position is bare.
    pub fn on_primary_interaction(&mut self, offset: usize, set: &AnnotationSet) {
        match set.lookup(offset) {
            Some(annotation) => {
                self.detail = ActiveDetail::Open(*annotation);
            }
            None => {
                self.detail = ActiveDetail::Closed;
            }
        }
    }

    /// Jump from an external list: select exactly the annotation's range,
    /// give the editing surface focus, scroll its start line two rows below
    /// the top (clamped to 0), and open the detail.
    pub fn jump_to(&mut self, view: &mut EditorView, buffer: &Buffer, annotation: Annotation) {
        view.set_selection(annotation.range());
        view.focus();
        let line = buffer.line_of_offset(annotation.start);
        view.scroll_top = line.saturating_sub(JUMP_CONTEXT_ROWS);
        self.detail = ActiveDetail::Open(annotation);
    }
}
