//! Application state and event routing
//!
//! One `App` owns the buffer, the annotation set, the views and the
//! injected services, and everything happens on the single UI loop: key and
//! mouse events mutate state, `on_tick` drains completed provider calls,
//! and `render` recomputes the styled projection from scratch each frame.

use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::Frame;

use crate::annotation::{Annotation, AnnotationKind, AnnotationSet, HighlightTier};
use crate::apply::{apply_suggestion, ignore_issue, reject_suggestion, Applied};
use crate::buffer::Buffer;
use crate::compose::compose;
use crate::config::Config;
use crate::interact::InteractionController;
use crate::services::analysis::{AnalysisEvent, AnalysisProvider, AnalysisService};
use crate::services::store::{DocumentStore, Snapshot};
use crate::tier::select_tier;
use crate::view::editor::EditorView;
use crate::view::popup;
use crate::view::sidebar::{FindingRef, Sidebar};
use crate::view::status_bar::render_status_bar;
use crate::view::theme::Theme;

/// One-line input for assistant requests.
#[derive(Debug, Default)]
struct Prompt {
    input: String,
}

pub struct App {
    pub buffer: Buffer,
    pub annotations: AnnotationSet,
    pub editor: EditorView,
    pub sidebar: Sidebar,
    pub interact: InteractionController,
    pub config: Config,
    pub theme: Theme,
    pub title: String,

    analysis: AnalysisService,
    store: Box<dyn DocumentStore>,

    status_message: Option<String>,
    chat_response: Option<String>,
    prompt: Option<Prompt>,
    should_quit: bool,

    // Layout from the last render, for mouse hit testing
    editor_area: Rect,
    sidebar_area: Rect,
}

impl App {
    /// Build the app and load the persisted document, if any.
    pub fn new(
        config: Config,
        provider: Arc<dyn AnalysisProvider>,
        store: Box<dyn DocumentStore>,
        handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let snapshot = store.load()?;
        let (title, text) = match snapshot {
            Some(snapshot) => (snapshot.title, snapshot.text),
            None => (String::from("untitled"), String::new()),
        };
        let buffer = Buffer::from_str(&text);
        let annotations = AnnotationSet::rebuild(vec![], vec![], &buffer);
        let analysis = AnalysisService::new(provider, handle);

        Ok(Self {
            buffer,
            annotations,
            editor: EditorView::new(),
            sidebar: Sidebar::new(),
            interact: InteractionController::new(),
            config,
            theme: Theme::dark(),
            title,
            analysis,
            store,
            status_message: None,
            chat_response: None,
            prompt: None,
            should_quit: false,
            editor_area: Rect::default(),
            sidebar_area: Rect::default(),
        })
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    // --- commands ---

    /// Send the buffer out for style analysis. Previous annotations stay
    /// on screen until the result lands.
    pub fn request_analysis(&mut self) {
        self.analysis
            .request_analysis(self.buffer.as_str().to_string(), self.config.style.clone());
        self.status_message = Some("analyzing…".to_string());
    }

    /// Ask the provider for edit suggestions over the current text.
    pub fn request_suggestions(&mut self) {
        let model = self.config.models.medium.clone();
        self.analysis.request_suggestions(
            self.buffer.as_str().to_string(),
            model,
            self.config.style.clone(),
            self.annotations.issues().to_vec(),
        );
        self.status_message = Some("requesting edits…".to_string());
    }

    /// Route a free-text request through the tier selector and off to the
    /// chat provider, with the current selection as context.
    pub fn request_chat(&mut self, prompt_text: String) {
        let tier = select_tier(&prompt_text);
        let model = self.config.models.resolve(tier).to_string();
        let context = self
            .editor
            .selection
            .clone()
            .map(|sel| self.buffer.as_str()[self.buffer.clamp_range(sel)].to_string());
        tracing::info!("chat request routed to {} tier ({})", tier.label(), model);
        self.analysis.request_chat(model.clone(), prompt_text, context);
        self.status_message = Some(format!("asking {}…", model));
    }

    /// Persist the buffer plus computed metadata.
    pub fn save(&mut self) {
        let snapshot = Snapshot {
            title: self.title.clone(),
            text: self.buffer.as_str().to_string(),
            word_count: self.buffer.word_count(),
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        match self.store.save(&snapshot) {
            Ok(()) => {
                self.buffer.mark_saved();
                self.status_message = Some(format!("saved ({} words)", snapshot.word_count));
            }
            Err(e) => {
                tracing::error!("save failed: {:#}", e);
                self.status_message = Some(format!("save failed: {}", e));
            }
        }
    }

    // --- provider completions ---

    /// Drain completed provider calls. Stale completions (an older request
    /// superseded by a newer one) are discarded outright; failures surface
    /// as a status notice and leave existing annotations untouched.
    pub fn on_tick(&mut self) {
        while let Some(event) = self.analysis.try_recv() {
            if !self.analysis.is_current(&event) {
                tracing::debug!("discarding stale analysis completion");
                continue;
            }
            match event {
                AnalysisEvent::Issues { outcome, .. } => match outcome {
                    Ok(issues) => {
                        let count = issues.len();
                        self.annotations = AnnotationSet::rebuild(
                            issues,
                            self.annotations.suggestions().to_vec(),
                            &self.buffer,
                        );
                        self.after_set_change();
                        self.status_message = Some(format!("{} issues found", count));
                    }
                    Err(e) => {
                        tracing::warn!("analysis failed: {}", e);
                        self.status_message = Some(format!("analysis failed: {}", e));
                    }
                },
                AnalysisEvent::Suggestions { outcome, .. } => match outcome {
                    Ok(suggestions) => {
                        let count = suggestions.len();
                        self.annotations = AnnotationSet::rebuild(
                            self.annotations.issues().to_vec(),
                            suggestions,
                            &self.buffer,
                        );
                        self.after_set_change();
                        self.status_message = Some(format!("{} edits suggested", count));
                    }
                    Err(e) => {
                        tracing::warn!("suggestion request failed: {}", e);
                        self.status_message = Some(format!("edit request failed: {}", e));
                    }
                },
                AnalysisEvent::Chat { outcome, .. } => match outcome {
                    Ok(response) => {
                        self.chat_response = Some(response);
                        self.status_message = None;
                    }
                    Err(e) => {
                        tracing::warn!("chat failed: {}", e);
                        self.status_message = Some(format!("assistant failed: {}", e));
                    }
                },
            }
        }
    }

    fn after_set_change(&mut self) {
        self.editor
            .sync_annotations(self.annotations.len(), &self.buffer);
        self.sidebar.clamp_selection(&self.annotations);
        if let Some(open) = self.interact.active() {
            // The open detail may point at a finding that no longer exists
            let still_there = match open.kind {
                AnnotationKind::Issue(i) => self.annotations.issue(i).is_some(),
                AnnotationKind::Suggestion(s) => self.annotations.suggestion(s).is_some(),
            };
            if !still_there {
                self.interact.dismiss();
            }
        }
    }

    // --- events ---

    pub fn handle_event(&mut self, event: CrosstermEvent) {
        match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key(key);
            }
            CrosstermEvent::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('g') => self.request_analysis(),
                KeyCode::Char('e') => self.request_suggestions(),
                KeyCode::Char('r') => self.prompt = Some(Prompt::default()),
                KeyCode::Char('o') => {
                    self.interact
                        .on_primary_interaction(self.editor.caret, &self.annotations);
                }
                _ => {}
            }
            return;
        }

        if self.chat_response.is_some() {
            if key.code == KeyCode::Esc {
                self.chat_response = None;
            }
            return;
        }

        if self.interact.is_open() && self.handle_detail_key(key) {
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.sidebar.focused = !self.sidebar.focused;
                self.editor.focused = !self.sidebar.focused;
            }
            _ if self.sidebar.focused => self.handle_sidebar_key(key),
            _ => self.handle_editor_key(key),
        }
    }

    /// Keys consumed by the open detail popover. Returns false for keys
    /// that should fall through (which also dismisses the popover).
    fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
        let Some(annotation) = self.interact.active().copied() else {
            return false;
        };
        match (key.code, annotation.kind) {
            (KeyCode::Esc, _) => {
                self.interact.dismiss();
                true
            }
            (KeyCode::Char('a'), AnnotationKind::Suggestion(index)) => {
                let outcome = apply_suggestion(&mut self.buffer, &mut self.annotations, index);
                self.status_message = Some(
                    match outcome {
                        Applied::Range => "suggestion applied",
                        Applied::Line => "suggestion applied to line",
                        Applied::OutOfRange => "suggestion line out of range, nothing changed",
                        Applied::Missing => "suggestion no longer available",
                    }
                    .to_string(),
                );
                self.interact.dismiss();
                self.after_set_change();
                true
            }
            (KeyCode::Char('x'), AnnotationKind::Suggestion(index)) => {
                reject_suggestion(&mut self.annotations, index);
                self.interact.dismiss();
                self.after_set_change();
                true
            }
            (KeyCode::Char('i') | KeyCode::Char('x'), AnnotationKind::Issue(index)) => {
                ignore_issue(&mut self.annotations, index);
                self.interact.dismiss();
                self.after_set_change();
                true
            }
            _ => {
                // Anything else closes the popover and falls through
                self.interact.dismiss();
                false
            }
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down => self.sidebar.select_next(&self.annotations),
            KeyCode::Up => self.sidebar.select_prev(),
            KeyCode::Enter => self.jump_to_selected(),
            _ => {}
        }
    }

    /// Jump from the sidebar list into the text. Findings whose range could
    /// not be located fall back to a zero-width target at their source
    /// line's start.
    fn jump_to_selected(&mut self) {
        let Some(item) = self.sidebar.selected_item(&self.annotations) else {
            return;
        };
        let annotation = match item {
            FindingRef::Issue(index) => self
                .annotations
                .annotations()
                .iter()
                .find(|a| a.kind == AnnotationKind::Issue(index))
                .copied(),
            FindingRef::Suggestion(index) => self
                .annotations
                .annotations()
                .iter()
                .find(|a| a.kind == AnnotationKind::Suggestion(index))
                .copied()
                .or_else(|| {
                    let suggestion = self.annotations.suggestion(index)?;
                    let line = suggestion.source_line.checked_sub(1)?;
                    let start = self.buffer.line_start_offset(line)?;
                    Some(Annotation {
                        start,
                        end: start,
                        kind: AnnotationKind::Suggestion(index),
                        tier: HighlightTier::Suggestion,
                    })
                }),
        };
        match annotation {
            Some(annotation) => {
                self.interact
                    .jump_to(&mut self.editor, &self.buffer, annotation);
                self.sidebar.focused = false;
            }
            None => {
                self.status_message = Some("finding has no locatable range".to_string());
            }
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let margin = self.config.editor.scroll_offset;
        match key.code {
            KeyCode::Char(c) => self.editor.insert_char(&mut self.buffer, c),
            KeyCode::Enter => self.editor.insert_newline(&mut self.buffer),
            KeyCode::Backspace => self.editor.backspace(&mut self.buffer),
            KeyCode::Delete => self.editor.delete_forward(&mut self.buffer),
            KeyCode::Left => self.editor.move_left(&self.buffer),
            KeyCode::Right => self.editor.move_right(&self.buffer),
            KeyCode::Up => self.editor.move_up(&self.buffer),
            KeyCode::Down => self.editor.move_down(&self.buffer),
            KeyCode::Home => self.editor.move_line_start(&self.buffer),
            KeyCode::End => self.editor.move_line_end(&self.buffer),
            KeyCode::PageUp => self.editor.move_page_up(&self.buffer),
            KeyCode::PageDown => self.editor.move_page_down(&self.buffer),
            KeyCode::Esc => self.editor.clear_selection(),
            _ => return,
        }
        self.editor.ensure_caret_visible(&self.buffer, margin);
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Enter => {
                let text = self.prompt.take().map(|p| p.input).unwrap_or_default();
                if !text.trim().is_empty() {
                    self.request_chat(text);
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let pos = ratatui::layout::Position::new(mouse.column, mouse.row);
                if self.editor_area.contains(pos) {
                    self.sidebar.focused = false;
                    self.editor.focus();
                    if let Some(offset) = self.editor.offset_at_cell(
                        &self.buffer,
                        self.editor_area,
                        mouse.column,
                        mouse.row,
                    ) {
                        self.editor.caret = offset;
                        self.editor.clear_selection();
                        self.interact
                            .on_primary_interaction(offset, &self.annotations);
                    }
                } else if self.sidebar_area.contains(pos) {
                    self.sidebar.focused = true;
                    self.editor.focused = false;
                }
            }
            MouseEventKind::ScrollDown => {
                let max = self.buffer.line_count().saturating_sub(1);
                self.editor.scroll_top = (self.editor.scroll_top + 3).min(max);
            }
            MouseEventKind::ScrollUp => {
                self.editor.scroll_top = self.editor.scroll_top.saturating_sub(3);
            }
            _ => {}
        }
    }

    // --- rendering ---

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let prompt_rows = if self.prompt.is_some() { 1 } else { 0 };
        if area.height < 2 + prompt_rows {
            return;
        }

        let main_height = area.height - 1 - prompt_rows;
        let sidebar_width =
            ((area.width as f32 * self.config.editor.sidebar_width) as u16).min(area.width / 2);
        self.sidebar_area = Rect::new(area.x, area.y, sidebar_width, main_height);
        self.editor_area = Rect::new(
            area.x + sidebar_width,
            area.y,
            area.width - sidebar_width,
            main_height,
        );
        let status_area = Rect::new(area.x, area.y + main_height, area.width, 1);

        // The styled projection is recomputed from scratch on every frame,
        // so any buffer or annotation change is reflected immediately.
        let segments = compose(&self.buffer, &self.annotations);
        self.editor.render(
            frame,
            self.editor_area,
            &self.buffer,
            &segments,
            &self.theme,
        );
        self.sidebar
            .render(frame, self.sidebar_area, &self.annotations, &self.theme);
        render_status_bar(
            frame,
            status_area,
            &self.title,
            &self.buffer,
            &self.editor,
            &self.annotations,
            self.status_message.as_deref(),
            self.analysis.has_inflight(),
            &self.theme,
        );

        if let Some(prompt) = &self.prompt {
            let prompt_area = Rect::new(area.x, area.y + main_height + 1, area.width, 1);
            let text = format!("Ask: {}", prompt.input);
            frame.render_widget(
                ratatui::widgets::Paragraph::new(text.clone()).style(self.theme.base_style()),
                prompt_area,
            );
            frame.set_cursor_position(ratatui::layout::Position::new(
                prompt_area.x + text.chars().count() as u16,
                prompt_area.y,
            ));
        }

        if let Some(response) = &self.chat_response {
            popup::render_response(frame, area, response, &self.theme);
        } else if let Some(annotation) = self.interact.active() {
            popup::render_detail(frame, area, annotation, &self.annotations, &self.theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::Snapshot;
    use anyhow::Result as AnyResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NullProvider;

    #[async_trait]
    impl AnalysisProvider for NullProvider {
        async fn analyze(
            &self,
            _text: &str,
            _rules: &crate::config::StyleRules,
        ) -> AnyResult<Vec<crate::annotation::Issue>> {
            Ok(vec![])
        }

        async fn suggest_edits(
            &self,
            _text: &str,
            _model: &str,
            _rules: &crate::config::StyleRules,
            _issues: &[crate::annotation::Issue],
        ) -> AnyResult<Vec<crate::annotation::Suggestion>> {
            Ok(vec![])
        }

        async fn chat(
            &self,
            _model: &str,
            _prompt: &str,
            _context: Option<&str>,
        ) -> AnyResult<String> {
            Ok(String::new())
        }
    }

    struct MemoryStore {
        snapshot: Mutex<Option<Snapshot>>,
    }

    impl MemoryStore {
        fn with(snapshot: Option<Snapshot>) -> Self {
            Self {
                snapshot: Mutex::new(snapshot),
            }
        }
    }

    impl DocumentStore for MemoryStore {
        fn load(&self) -> AnyResult<Option<Snapshot>> {
            Ok(self.snapshot.lock().unwrap().clone())
        }

        fn save(&self, snapshot: &Snapshot) -> AnyResult<()> {
            *self.snapshot.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }

    fn test_app(initial: Option<Snapshot>) -> (App, tokio::runtime::Runtime) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let app = App::new(
            Config::default(),
            Arc::new(NullProvider),
            Box::new(MemoryStore::with(initial)),
            runtime.handle().clone(),
        )
        .unwrap();
        (app, runtime)
    }

    #[test]
    fn test_loads_document_from_store() {
        let (app, _rt) = test_app(Some(Snapshot {
            title: "Draft".to_string(),
            text: "He was very cold.".to_string(),
            word_count: 4,
            saved_at: None,
        }));
        assert_eq!(app.title, "Draft");
        assert_eq!(app.buffer.as_str(), "He was very cold.");
    }

    #[test]
    fn test_typing_mutates_buffer() {
        let (mut app, _rt) = test_app(None);
        app.handle_key(KeyEvent::new(KeyCode::Char('h'), KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('i'), KeyModifiers::NONE));
        assert_eq!(app.buffer.as_str(), "hi");
        assert!(app.buffer.is_modified());
    }

    #[test]
    fn test_save_writes_word_count() {
        let (mut app, _rt) = test_app(None);
        for c in "three little words".chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(!app.buffer.is_modified());
        let saved = app.store.load().unwrap().expect("snapshot saved");
        assert_eq!(saved.word_count, 3);
        assert!(saved.saved_at.is_some());
    }

    #[test]
    fn test_tab_toggles_focus() {
        let (mut app, _rt) = test_app(None);
        assert!(app.editor.focused);
        app.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        assert!(app.sidebar.focused);
        assert!(!app.editor.focused);
    }

    #[test]
    fn test_quit_key() {
        let (mut app, _rt) = test_app(None);
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }
}
