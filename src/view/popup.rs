//! The detail popover
//!
//! Renders the single open annotation detail near the bottom of the
//! screen: severity badge, kind and message for an issue; old/new text,
//! rationale and the apply/dismiss hints for a suggestion. Also used for
//! free-text assistant responses. Only ever one popover; the interaction
//! controller guarantees that.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::annotation::{Annotation, AnnotationKind, AnnotationSet};
use crate::view::theme::Theme;

/// Popover area: bottom-centered, at most `height` rows.
fn popup_area(container: Rect, height: u16) -> Rect {
    let width = container.width.saturating_sub(8).clamp(20, 80);
    let height = height.min(container.height.saturating_sub(2));
    let x = container.x + (container.width.saturating_sub(width)) / 2;
    let y = container.y + container.height.saturating_sub(height + 1);
    Rect::new(x, y, width, height)
}

fn render_frame<'a>(
    frame: &mut Frame,
    container: Rect,
    title: &'a str,
    lines: Vec<Line<'a>>,
    theme: &Theme,
) {
    // Body height plus the border rows; never paint outside the frame
    let area = popup_area(container, lines.len() as u16 + 2).intersection(container);
    if area.width == 0 || area.height == 0 {
        return;
    }
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.popup_border))
        .title(title)
        .style(Style::default().fg(theme.popup_fg).bg(theme.popup_bg));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Left),
        area,
    );
}

/// Render the detail for the open annotation.
pub fn render_detail(
    frame: &mut Frame,
    container: Rect,
    annotation: &Annotation,
    set: &AnnotationSet,
    theme: &Theme,
) {
    match annotation.kind {
        AnnotationKind::Issue(index) => {
            let Some(issue) = set.issue(index) else {
                return;
            };
            let badge_style = Style::default()
                .fg(theme.popup_bg)
                .bg(theme.tier_accent(annotation.tier))
                .add_modifier(Modifier::BOLD);
            let lines = vec![
                Line::from(vec![
                    Span::styled(format!(" {} ", issue.severity.label()), badge_style),
                    Span::raw(" "),
                    Span::styled(
                        issue.kind.clone(),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                ]),
                Line::from(issue.message.clone()),
                Line::from(Span::styled(
                    "[i] ignore   [esc] close",
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ];
            render_frame(frame, container, "Issue", lines, theme);
        }
        AnnotationKind::Suggestion(index) => {
            let Some(suggestion) = set.suggestion(index) else {
                return;
            };
            let mut lines = vec![
                Line::from(vec![
                    Span::raw("old: "),
                    Span::styled(
                        suggestion.old_text.clone(),
                        Style::default().bg(theme.popup_old_bg),
                    ),
                ]),
                Line::from(vec![
                    Span::raw("new: "),
                    Span::styled(
                        suggestion.new_text.clone(),
                        Style::default().bg(theme.popup_new_bg),
                    ),
                ]),
            ];
            if let Some(rationale) = &suggestion.rationale {
                lines.push(Line::from(Span::styled(
                    rationale.clone(),
                    Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
                )));
            }
            lines.push(Line::from(Span::styled(
                "[a] apply   [x] dismiss   [esc] close",
                Style::default().add_modifier(Modifier::DIM),
            )));
            render_frame(frame, container, "Suggestion", lines, theme);
        }
    }
}

/// Render a free-text assistant response in the same popover chrome.
pub fn render_response(frame: &mut Frame, container: Rect, text: &str, theme: &Theme) {
    let mut lines: Vec<Line> = text.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(Span::styled(
        "[esc] close",
        Style::default().add_modifier(Modifier::DIM),
    )));
    render_frame(frame, container, "Assistant", lines, theme);
}
