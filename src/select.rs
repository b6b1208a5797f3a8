//! Representative frame selection.
//!
//! Tracks the full, uncropped frame behind the highest-confidence detection
//! whose classification produced at least one non-sentinel guess. A strong
//! detection classified as Undetermined must not displace the stored frame,
//! so eligibility is decided by the orchestrator after classification.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::frame::Frame;
use crate::now_ms;

#[derive(Default)]
pub struct RepresentativeFrameSelector {
    best: Option<(Frame, f32)>,
}

impl RepresentativeFrameSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an eligible frame. Keeps a deep copy only when the detection
    /// confidence strictly exceeds the current maximum.
    pub fn offer(&mut self, frame: &Frame, confidence: f32) {
        let replace = match &self.best {
            Some((_, best)) => confidence > *best,
            None => true,
        };
        if replace {
            let digest = frame.digest();
            log::debug!(
                "representative frame: index {} at confidence {:.3}, content {:02x}{:02x}{:02x}{:02x}",
                frame.index,
                confidence,
                digest[0],
                digest[1],
                digest[2],
                digest[3]
            );
            self.best = Some((frame.clone(), confidence));
        }
    }

    pub fn best_confidence(&self) -> Option<f32> {
        self.best.as_ref().map(|(_, c)| *c)
    }

    /// Persist the stored frame as a PNG under `frames_dir`, creating the
    /// directory if absent. The filename is derived from a millisecond
    /// timestamp so re-analyses never collide. Returns `None` when no frame
    /// was ever stored.
    pub fn persist(&self, frames_dir: &Path) -> Result<Option<PathBuf>> {
        let Some((frame, confidence)) = &self.best else {
            return Ok(None);
        };
        std::fs::create_dir_all(frames_dir)
            .with_context(|| format!("failed to create frames dir {}", frames_dir.display()))?;
        let path = frames_dir.join(format!("frame_{}.png", now_ms()));
        frame
            .to_rgb_image()?
            .save(&path)
            .with_context(|| format!("failed to write representative frame {}", path.display()))?;
        log::info!(
            "representative frame written to {} (confidence {:.3})",
            path.display(),
            confidence
        );
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fill: u8, index: u64) -> Frame {
        Frame::new(vec![fill; 4 * 4 * 3], 4, 4, index).unwrap()
    }

    #[test]
    fn keeps_highest_confidence_frame() {
        let mut selector = RepresentativeFrameSelector::new();
        selector.offer(&frame(1, 0), 0.6);
        selector.offer(&frame(2, 1), 0.9);
        selector.offer(&frame(3, 2), 0.7);
        assert_eq!(selector.best_confidence(), Some(0.9));
    }

    #[test]
    fn equal_confidence_does_not_replace() {
        let mut selector = RepresentativeFrameSelector::new();
        selector.offer(&frame(1, 0), 0.8);
        selector.offer(&frame(2, 1), 0.8);
        let (kept, _) = selector.best.as_ref().unwrap();
        assert_eq!(kept.index, 0);
    }

    #[test]
    fn persist_without_frame_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let selector = RepresentativeFrameSelector::new();
        assert!(selector.persist(dir.path()).unwrap().is_none());
    }

    #[test]
    fn persist_writes_png_into_created_dir() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        let mut selector = RepresentativeFrameSelector::new();
        selector.offer(&frame(200, 3), 0.95);

        let path = selector.persist(&frames_dir).unwrap().unwrap();
        assert!(path.starts_with(&frames_dir));
        assert_eq!(path.extension().unwrap(), "png");
        assert!(path.metadata().unwrap().len() > 0);
    }
}
