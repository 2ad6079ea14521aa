//! Status bar rendering

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::annotation::AnnotationSet;
use crate::buffer::Buffer;
use crate::view::editor::EditorView;
use crate::view::theme::Theme;

/// Render the one-row status bar: document info and caret position on the
/// left, analysis state and word count pinned to the right.
#[allow(clippy::too_many_arguments)]
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    buffer: &Buffer,
    view: &EditorView,
    set: &AnnotationSet,
    status_message: Option<&str>,
    analyzing: bool,
    theme: &Theme,
) {
    let style = Style::default()
        .fg(theme.status_bar_fg)
        .bg(theme.status_bar_bg);

    let modified = if buffer.is_modified() { " [+]" } else { "" };
    let (line, col) = view.caret_line_col(buffer);

    let (errors, warnings, infos) = set.severity_counts();
    let mut counts = Vec::new();
    if errors > 0 {
        counts.push(format!("E:{}", errors));
    }
    if warnings > 0 {
        counts.push(format!("W:{}", warnings));
    }
    if infos > 0 {
        counts.push(format!("I:{}", infos));
    }
    if !set.suggestions().is_empty() {
        counts.push(format!("S:{}", set.suggestions().len()));
    }
    let counts_summary = if counts.is_empty() {
        String::new()
    } else {
        format!(" | {}", counts.join(" "))
    };

    let message_suffix = match status_message {
        Some(msg) if !msg.is_empty() => format!(" | {}", msg),
        _ => String::new(),
    };

    // Lines and columns display 1-indexed
    let left = format!(
        "{title}{modified} | Ln {}, Col {}{counts_summary}{message_suffix}",
        line + 1,
        col + 1
    );

    let right = if analyzing {
        format!(" analyzing… | {} words ", buffer.word_count())
    } else {
        format!(" {} words ", buffer.word_count())
    };

    let width = area.width as usize;
    let right_len = right.chars().count();
    let left_max = width.saturating_sub(right_len + 1);
    let left_display: String = if left.chars().count() > left_max {
        left.chars().take(left_max.saturating_sub(1)).chain("…".chars()).collect()
    } else {
        left.clone()
    };
    let padding = width
        .saturating_sub(left_display.chars().count())
        .saturating_sub(right_len);

    let spans = vec![
        Span::styled(left_display, style),
        Span::styled(" ".repeat(padding), style),
        Span::styled(right, style),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)).style(style), area);
}
