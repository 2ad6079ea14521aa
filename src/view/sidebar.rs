//! Finding sidebar
//!
//! A navigable list of the current issues and suggestions, the external
//! list the jump-to flow starts from. Items mirror the raw finding lists,
//! so suggestions whose range could not be located still show up (they can
//! be applied through the line fallback).

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::annotation::{AnnotationSet, HighlightTier, Severity};
use crate::view::theme::Theme;

/// What a sidebar row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingRef {
    Issue(usize),
    Suggestion(usize),
}

#[derive(Debug, Default)]
pub struct Sidebar {
    pub selected: usize,
    pub focused: bool,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in display order: issues first, then suggestions.
    pub fn items(set: &AnnotationSet) -> Vec<FindingRef> {
        let mut items: Vec<FindingRef> = (0..set.issues().len()).map(FindingRef::Issue).collect();
        items.extend((0..set.suggestions().len()).map(FindingRef::Suggestion));
        items
    }

    pub fn clamp_selection(&mut self, set: &AnnotationSet) {
        let count = set.issues().len() + set.suggestions().len();
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }

    pub fn select_next(&mut self, set: &AnnotationSet) {
        self.selected += 1;
        self.clamp_selection(set);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_item(&self, set: &AnnotationSet) -> Option<FindingRef> {
        Self::items(set).get(self.selected).copied()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, set: &AnnotationSet, theme: &Theme) {
        let base = Style::default().fg(theme.sidebar_fg).bg(theme.sidebar_bg);
        let selected_style = Style::default()
            .fg(theme.sidebar_selected_fg)
            .bg(theme.sidebar_selected_bg);

        let items = Self::items(set);
        let mut lines: Vec<Line> = Vec::new();
        if items.is_empty() {
            lines.push(Line::from(Span::styled(
                "no findings",
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        // Keep the selection on screen in long lists
        let height = area.height.saturating_sub(2) as usize;
        let first = self.selected.saturating_sub(height.saturating_sub(1));
        for (idx, item) in items.iter().enumerate().skip(first).take(height.max(1)) {
            let row_style = if self.focused && idx == self.selected {
                selected_style
            } else {
                base
            };
            let line = match item {
                FindingRef::Issue(i) => {
                    let Some(issue) = set.issue(*i) else { continue };
                    Line::from(vec![
                        Span::styled(
                            severity_bullet(issue.severity),
                            Style::default().fg(theme.tier_accent(issue.severity.tier())),
                        ),
                        Span::styled(format!("{}: {}", issue.kind, issue.message), row_style),
                    ])
                }
                FindingRef::Suggestion(s) => {
                    let Some(suggestion) = set.suggestion(*s) else {
                        continue;
                    };
                    Line::from(vec![
                        Span::styled(
                            "~ ",
                            Style::default().fg(theme.tier_accent(HighlightTier::Suggestion)),
                        ),
                        Span::styled(
                            format!("L{}: {}", suggestion.source_line, suggestion.new_text),
                            row_style,
                        ),
                    ])
                }
            };
            lines.push(line);
        }

        let title = if self.focused {
            "Findings [enter: jump]"
        } else {
            "Findings"
        };
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .style(base)
                .block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
    }
}

fn severity_bullet(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "E ",
        Severity::Warning => "W ",
        Severity::Info => "I ",
        Severity::Unknown => "? ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Issue, Suggestion};
    use crate::buffer::Buffer;

    fn sample_set() -> AnnotationSet {
        let buffer = Buffer::from_str("he was very cold");
        AnnotationSet::rebuild(
            vec![Issue {
                kind: "filler".to_string(),
                severity: Severity::Warning,
                message: "filler word".to_string(),
                range: Some(7..11),
            }],
            vec![Suggestion {
                source_line: 1,
                old_text: "cold".to_string(),
                new_text: "freezing".to_string(),
                rationale: None,
                range: None,
            }],
            &buffer,
        )
    }

    #[test]
    fn test_items_cover_both_lists() {
        let set = sample_set();
        let items = Sidebar::items(&set);
        assert_eq!(items, vec![FindingRef::Issue(0), FindingRef::Suggestion(0)]);
    }

    #[test]
    fn test_selection_navigation_clamps() {
        let set = sample_set();
        let mut sidebar = Sidebar::new();
        assert_eq!(sidebar.selected_item(&set), Some(FindingRef::Issue(0)));

        sidebar.select_next(&set);
        assert_eq!(sidebar.selected_item(&set), Some(FindingRef::Suggestion(0)));

        // Already at the end
        sidebar.select_next(&set);
        assert_eq!(sidebar.selected_item(&set), Some(FindingRef::Suggestion(0)));

        sidebar.select_prev();
        sidebar.select_prev();
        assert_eq!(sidebar.selected_item(&set), Some(FindingRef::Issue(0)));
    }

    #[test]
    fn test_selection_survives_shrinking_set() {
        let mut set = sample_set();
        let mut sidebar = Sidebar::new();
        sidebar.select_next(&set);

        set.remove_suggestion(0);
        sidebar.clamp_selection(&set);
        assert_eq!(sidebar.selected_item(&set), Some(FindingRef::Issue(0)));
    }

    #[test]
    fn test_empty_set_has_no_selection() {
        let buffer = Buffer::from_str("");
        let set = AnnotationSet::rebuild(vec![], vec![], &buffer);
        let sidebar = Sidebar::new();
        assert_eq!(sidebar.selected_item(&set), None);
    }
}
