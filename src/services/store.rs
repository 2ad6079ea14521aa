//! Document persistence
//!
//! The editor reads the current document on load and writes it back, plus
//! computed metadata, on explicit save. Persistence is an injected
//! dependency so the core never touches the disk directly and tests can
//! substitute an in-memory store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A persisted document: the text plus save-time metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub word_count: usize,
    /// RFC 3339 timestamp of the last save
    #[serde(default)]
    pub saved_at: Option<String>,
}

pub trait DocumentStore {
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot as a JSON file on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading document {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("parsing document {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("writing document {}", self.path.display()))?;
        tracing::info!(
            "saved {} ({} words)",
            self.path.display(),
            snapshot.word_count
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("story.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("story.json"));

        let snapshot = Snapshot {
            title: "Chapter One".to_string(),
            text: "He was very cold.".to_string(),
            word_count: 4,
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap().expect("snapshot saved");
        assert_eq!(loaded.title, "Chapter One");
        assert_eq!(loaded.text, "He was very cold.");
        assert_eq!(loaded.word_count, 4);
        assert!(loaded.saved_at.is_some());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.json");
        std::fs::write(&path, "{{{").unwrap();
        let store = JsonFileStore::new(path);
        assert!(store.load().is_err());
    }
}
