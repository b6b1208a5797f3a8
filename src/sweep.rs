//! Orphan frame cleanup.
//!
//! Representative frames are written before the history entry that points at
//! them, so an interrupted run can leave image files nothing references. The
//! sweep walks the frames directory and removes every file no history entry
//! claims as its display image.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::history::HistoryStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub removed: usize,
}

/// Remove frame files that no history entry references.
///
/// A missing frames directory is a no-op. Files that fail to delete are
/// logged and counted as scanned only; the sweep never fails a startup.
pub fn sweep_orphan_frames(frames_dir: &Path, history: &HistoryStore) -> Result<SweepStats> {
    let mut stats = SweepStats::default();
    if !frames_dir.is_dir() {
        return Ok(stats);
    }

    let referenced: HashSet<String> = history
        .load()
        .context("failed to load history for sweep")?
        .into_iter()
        .filter_map(|e| e.display_image_path)
        .collect();

    let dir = std::fs::read_dir(frames_dir)
        .with_context(|| format!("failed to read frames directory {}", frames_dir.display()))?;
    for entry in dir {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        stats.scanned += 1;
        let claimed = referenced
            .iter()
            .any(|r| Path::new(r) == path || path.to_string_lossy().as_ref() == r.as_str());
        if claimed {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("removed orphan frame {}", path.display());
                stats.removed += 1;
            }
            Err(e) => log::warn!("failed to remove orphan frame {}: {}", path.display(), e),
        }
    }
    if stats.removed > 0 {
        log::info!(
            "frame sweep removed {} of {} files in {}",
            stats.removed,
            stats.scanned,
            frames_dir.display()
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{AnalysisKind, HistoryEntry};
    use chrono::Utc;

    #[test]
    fn missing_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(dir.path().join("history.json"));
        let stats = sweep_orphan_frames(&dir.path().join("frames"), &history).unwrap();
        assert_eq!(stats, SweepStats::default());
    }

    #[test]
    fn removes_only_unreferenced_files() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("frames");
        std::fs::create_dir(&frames).unwrap();
        let kept = frames.join("frame_1.png");
        let orphan = frames.join("frame_2.png");
        std::fs::write(&kept, b"png").unwrap();
        std::fs::write(&orphan, b"png").unwrap();

        let history = HistoryStore::new(dir.path().join("history.json"));
        history
            .record(HistoryEntry {
                original_file_path: "clip.mp4".to_string(),
                display_image_path: Some(kept.to_string_lossy().into_owned()),
                breed: "beagle".to_string(),
                confidence: 80.0,
                timestamp: Utc::now(),
                breed_info_text: String::new(),
                kind: AnalysisKind::Video,
            })
            .unwrap();

        let stats = sweep_orphan_frames(&frames, &history).unwrap();
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.removed, 1);
        assert!(kept.is_file());
        assert!(!orphan.exists());
    }
}
