//! Configuration
//!
//! Loaded from a JSON file; every field has a default so a missing or
//! partial file still produces a working setup. The style rules are passed
//! through to the analysis provider verbatim; the model table maps the
//! three service tiers to concrete model names.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tier::ModelTier;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub models: ModelConfig,

    #[serde(default)]
    pub style: StyleRules,

    #[serde(default)]
    pub editor: EditorConfig,
}

/// Analysis/chat provider endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Model names per service tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_cheap_model")]
    pub cheap: String,

    #[serde(default = "default_medium_model")]
    pub medium: String,

    #[serde(default = "default_heavy_model")]
    pub heavy: String,
}

fn default_cheap_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_medium_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_heavy_model() -> String {
    "llama3:70b".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cheap: default_cheap_model(),
            medium: default_medium_model(),
            heavy: default_heavy_model(),
        }
    }
}

impl ModelConfig {
    /// Model name for a resolved tier.
    pub fn resolve(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Cheap => &self.cheap,
            ModelTier::Medium => &self.medium,
            ModelTier::Heavy => &self.heavy,
        }
    }
}

/// House style rules forwarded to the analysis provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRules {
    #[serde(default = "default_true")]
    pub ban_em_dashes: bool,

    #[serde(default = "default_false")]
    pub narrative_contractions: bool,

    #[serde(default = "default_max_sentence_words")]
    pub max_sentence_words: usize,
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_max_sentence_words() -> usize {
    28
}

impl Default for StyleRules {
    fn default() -> Self {
        Self {
            ban_em_dashes: true,
            narrative_contractions: false,
            max_sentence_words: default_max_sentence_words(),
        }
    }
}

/// Editor behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Width of the finding sidebar as a fraction of the screen (0.0 to 1.0)
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: f32,

    /// Rows kept visible around the caret while scrolling
    #[serde(default = "default_scroll_offset")]
    pub scroll_offset: usize,
}

fn default_sidebar_width() -> f32 {
    0.3
}

fn default_scroll_offset() -> usize {
    3
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            sidebar_width: default_sidebar_width(),
            scroll_offset: default_scroll_offset(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Default config file location (`<config dir>/quill/config.json`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("config.json")
    }
}
