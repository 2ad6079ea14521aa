//! Analysis and chat provider client
//!
//! The provider is consumed over HTTP and never blocks the UI loop:
//! requests run on the tokio runtime (the blocking HTTP call itself inside
//! `spawn_blocking`) and completions come back over an unbounded channel
//! drained by the main loop each tick.
//!
//! Only one fetch cycle per stream is authoritative at a time. Every
//! request gets a monotonic sequence number; a completion older than the
//! latest issued request for its stream is stale and must be discarded by
//! the caller (checked via [`AnalysisService::is_current`]). There is no
//! explicit cancellation, just last-request-wins.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::annotation::{Issue, Severity, Suggestion};
use crate::config::StyleRules;

/// The opaque analysis/chat provider. A trait so tests can substitute a
/// stub without HTTP.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Style analysis over the full buffer text. Returns issues with byte
    /// ranges into the submitted text.
    async fn analyze(&self, text: &str, rules: &StyleRules) -> Result<Vec<Issue>>;

    /// Line-keyed edit suggestions for the submitted text.
    async fn suggest_edits(
        &self,
        text: &str,
        model: &str,
        rules: &StyleRules,
        issues: &[Issue],
    ) -> Result<Vec<Suggestion>>;

    /// Free-text chat/rewrite. The response is displayed, never parsed.
    async fn chat(&self, model: &str, prompt: &str, context: Option<&str>) -> Result<String>;
}

// Wire shapes of the provider endpoints.

#[derive(Serialize)]
struct HeuristicsRequest<'a> {
    text: &'a str,
    rules: &'a StyleRules,
}

#[derive(Deserialize)]
struct IssueDto {
    kind: String,
    #[serde(default)]
    severity: Severity,
    message: String,
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct HeuristicsResponse {
    issues: Vec<IssueDto>,
}

#[derive(Serialize)]
struct MinorEditRequest<'a> {
    text: &'a str,
    model: &'a str,
    style: &'a StyleRules,
    issues: &'a [Issue],
}

#[derive(Deserialize)]
struct EditDto {
    line: usize,
    old: String,
    new: String,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Deserialize)]
struct MinorEditResponse {
    edits: Vec<EditDto>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    context: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// HTTP implementation of [`AnalysisProvider`].
pub struct HttpProvider {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpProvider {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self { base_url, agent }
    }

    /// POST a JSON body and parse a JSON response on a blocking worker.
    async fn post_json<T: serde::de::DeserializeOwned + Send + 'static>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let response = agent
                .post(&url)
                .send_json(body)
                .map_err(|e| match e {
                    ureq::Error::Status(code, _) => {
                        anyhow!("provider returned HTTP {} for {}", code, url)
                    }
                    other => anyhow::Error::new(other).context(format!("requesting {}", url)),
                })?;
            let parsed = response
                .into_json::<T>()
                .with_context(|| format!("parsing response from {}", url))?;
            Ok(parsed)
        })
        .await
        .context("analysis worker panicked")?
    }
}

#[async_trait]
impl AnalysisProvider for HttpProvider {
    async fn analyze(&self, text: &str, rules: &StyleRules) -> Result<Vec<Issue>> {
        let body = serde_json::to_value(HeuristicsRequest { text, rules })?;
        let response: HeuristicsResponse = self.post_json("/api/heuristics", body).await?;
        Ok(response
            .issues
            .into_iter()
            .map(|dto| Issue {
                kind: dto.kind,
                severity: dto.severity,
                message: dto.message,
                range: Some(dto.start..dto.end),
            })
            .collect())
    }

    async fn suggest_edits(
        &self,
        text: &str,
        model: &str,
        rules: &StyleRules,
        issues: &[Issue],
    ) -> Result<Vec<Suggestion>> {
        let body = serde_json::to_value(MinorEditRequest {
            text,
            model,
            style: rules,
            issues,
        })?;
        let response: MinorEditResponse = self.post_json("/api/minor_edit", body).await?;
        Ok(response
            .edits
            .into_iter()
            .map(|dto| Suggestion {
                source_line: dto.line,
                old_text: dto.old,
                new_text: dto.new,
                rationale: dto.rationale,
                range: None,
            })
            .collect())
    }

    async fn chat(&self, model: &str, prompt: &str, context: Option<&str>) -> Result<String> {
        let body = serde_json::to_value(ChatRequest {
            model,
            prompt,
            context,
        })?;
        let response: ChatResponse = self.post_json("/api/chat", body).await?;
        Ok(response.response)
    }
}

/// A completed provider call, tagged with its request sequence number.
/// Errors travel as strings so events stay cheap to move around.
#[derive(Debug)]
pub enum AnalysisEvent {
    Issues {
        seq: u64,
        outcome: Result<Vec<Issue>, String>,
    },
    Suggestions {
        seq: u64,
        outcome: Result<Vec<Suggestion>, String>,
    },
    Chat {
        seq: u64,
        outcome: Result<String, String>,
    },
}

/// Dispatches provider calls and funnels completions back to the UI loop.
pub struct AnalysisService {
    provider: Arc<dyn AnalysisProvider>,
    handle: tokio::runtime::Handle,
    tx: UnboundedSender<AnalysisEvent>,
    rx: UnboundedReceiver<AnalysisEvent>,
    next_seq: u64,
    latest_issues_seq: u64,
    latest_suggestions_seq: u64,
    latest_chat_seq: u64,
    inflight: usize,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn AnalysisProvider>, handle: tokio::runtime::Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            handle,
            tx,
            rx,
            next_seq: 1,
            latest_issues_seq: 0,
            latest_suggestions_seq: 0,
            latest_chat_seq: 0,
            inflight: 0,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.inflight += 1;
        seq
    }

    /// Kick off a style analysis cycle; supersedes any outstanding one.
    pub fn request_analysis(&mut self, text: String, rules: StyleRules) -> u64 {
        let seq = self.bump_seq();
        self.latest_issues_seq = seq;
        tracing::info!("analysis request {} dispatched ({} bytes)", seq, text.len());
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let outcome = provider
                .analyze(&text, &rules)
                .await
                .map_err(|e| format!("{:#}", e));
            let _ = tx.send(AnalysisEvent::Issues { seq, outcome });
        });
        seq
    }

    /// Kick off an edit-suggestion cycle; supersedes any outstanding one.
    pub fn request_suggestions(
        &mut self,
        text: String,
        model: String,
        rules: StyleRules,
        issues: Vec<Issue>,
    ) -> u64 {
        let seq = self.bump_seq();
        self.latest_suggestions_seq = seq;
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let outcome = provider
                .suggest_edits(&text, &model, &rules, &issues)
                .await
                .map_err(|e| format!("{:#}", e));
            let _ = tx.send(AnalysisEvent::Suggestions { seq, outcome });
        });
        seq
    }

    /// Kick off a chat/rewrite request; supersedes any outstanding one.
    pub fn request_chat(&mut self, model: String, prompt: String, context: Option<String>) -> u64 {
        let seq = self.bump_seq();
        self.latest_chat_seq = seq;
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let outcome = provider
                .chat(&model, &prompt, context.as_deref())
                .await
                .map_err(|e| format!("{:#}", e));
            let _ = tx.send(AnalysisEvent::Chat { seq, outcome });
        });
        seq
    }

    /// Next completed event, if any. Decrements the inflight count for
    /// every event drained, stale or not.
    pub fn try_recv(&mut self) -> Option<AnalysisEvent> {
        let event = self.rx.try_recv().ok()?;
        self.inflight = self.inflight.saturating_sub(1);
        Some(event)
    }

    /// Whether `event` belongs to the latest issued request of its stream.
    /// Anything older lost the race and must be discarded.
    pub fn is_current(&self, event: &AnalysisEvent) -> bool {
        match event {
            AnalysisEvent::Issues { seq, .. } => *seq == self.latest_issues_seq,
            AnalysisEvent::Suggestions { seq, .. } => *seq == self.latest_suggestions_seq,
            AnalysisEvent::Chat { seq, .. } => *seq == self.latest_chat_seq,
        }
    }

    pub fn has_inflight(&self) -> bool {
        self.inflight > 0
    }
}
