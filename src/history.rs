//! Analysis history persistence.
//!
//! One JSON file holds every past analysis, newest first, keyed by the
//! original media path. Writes always rewrite the whole file; the store is
//! small (one entry per analyzed file) and a full rewrite keeps the format
//! trivially recoverable.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Image,
    Video,
}

/// One persisted analysis outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Path of the analyzed media as the user supplied it. Uniqueness key:
    /// re-analyzing the same file replaces its entry.
    pub original_file_path: String,
    /// Representative frame (video) or the image itself. Absent when the
    /// run produced nothing presentable.
    pub display_image_path: Option<String>,
    pub breed: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub breed_info_text: String,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
}

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries, newest first. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read history from {}", self.path.display())
                })
            }
        };
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("malformed history file {}", self.path.display()))?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Record an analysis. An existing entry for the same original path is
    /// replaced; the file is rewritten in full, newest first.
    pub fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.load()?;
        entries.retain(|e| e.original_file_path != entry.original_file_path);
        entries.insert(0, entry);
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.write(&entries)
    }

    /// Remove the entry for one original path. Returns whether it existed.
    pub fn delete(&self, original_file_path: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.original_file_path != original_file_path);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        self.write(&[])
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create history directory {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(entries).context("failed to encode history")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write history to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(path: &str, breed: &str, secs: i64) -> HistoryEntry {
        HistoryEntry {
            original_file_path: path.to_string(),
            display_image_path: None,
            breed: breed.to_string(),
            confidence: 80.0,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            breed_info_text: String::new(),
            kind: AnalysisKind::Video,
        }
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn records_newest_first_and_replaces_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        store.record(entry("a.mp4", "beagle", 100)).unwrap();
        store.record(entry("b.mp4", "poodle", 200)).unwrap();
        store.record(entry("a.mp4", "akita", 300)).unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].original_file_path, "a.mp4");
        assert_eq!(entries[0].breed, "akita");
        assert_eq!(entries[1].original_file_path, "b.mp4");
    }

    #[test]
    fn delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.record(entry("a.mp4", "beagle", 100)).unwrap();
        store.record(entry("b.mp4", "poodle", 200)).unwrap();

        assert!(store.delete("a.mp4").unwrap());
        assert!(!store.delete("a.mp4").unwrap());
        assert_eq!(store.load().unwrap().len(), 1);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn kind_serializes_lowercase_as_type() {
        let json = serde_json::to_string(&entry("a.mp4", "beagle", 1)).unwrap();
        assert!(json.contains("\"type\":\"video\""));
    }
}
