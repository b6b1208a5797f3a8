//! Subject detector adapter.
//!
//! Wraps a detector backend with everything the model itself does not know:
//! which artifact files must exist on disk, what the class indices mean, and
//! which classes count as a dog-like subject. The allow-set defaults to
//! `dog` and `horse`; the latter is a quirk of the training data that is kept
//! configurable rather than hard-coded.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;

use crate::detect::registry::BackendRegistry;
use crate::detect::result::{BoundingBox, Detection};
use crate::detect::DetectorBackend;
use crate::error::AnalysisError;
use crate::frame::{ChannelOrder, Frame};

/// On-disk artifacts of the subject-detection model: network weights, a
/// topology/config file, and a newline-delimited class-name list.
#[derive(Clone, Debug)]
pub struct DetectorArtifacts {
    pub weights: PathBuf,
    pub topology: PathBuf,
    pub class_names: PathBuf,
}

impl DetectorArtifacts {
    /// Check every artifact is resolvable. Reports all missing paths at once.
    pub fn verify(&self) -> Result<(), AnalysisError> {
        let missing: Vec<String> = [&self.weights, &self.topology, &self.class_names]
            .into_iter()
            .filter(|p| !p.is_file())
            .map(|p| p.display().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::ModelFilesMissing(missing.join(", ")))
        }
    }
}

pub struct SubjectDetector {
    registry: BackendRegistry,
    class_names: Vec<String>,
    allow_classes: Vec<String>,
    confidence_threshold: f32,
}

impl SubjectDetector {
    /// Load the detector from disk artifacts (tract backend).
    #[cfg(feature = "backend-tract")]
    pub fn load(
        artifacts: &DetectorArtifacts,
        allow_classes: Vec<String>,
        confidence_threshold: f32,
    ) -> Result<Self> {
        artifacts.verify()?;
        let class_names = read_class_names(&artifacts.class_names)?;
        let backend = crate::detect::backends::TractSsdBackend::new(&artifacts.weights)?;
        Ok(Self::from_backend(
            backend,
            class_names,
            allow_classes,
            confidence_threshold,
        ))
    }

    /// Build the adapter around an already-constructed backend.
    /// This is the injection seam used by tests and the model service.
    pub fn from_backend<B: DetectorBackend + 'static>(
        backend: B,
        class_names: Vec<String>,
        allow_classes: Vec<String>,
        confidence_threshold: f32,
    ) -> Self {
        let mut registry = BackendRegistry::new();
        registry.register(backend);
        Self {
            registry,
            class_names,
            allow_classes: allow_classes
                .into_iter()
                .map(|c| c.to_ascii_lowercase())
                .collect(),
            confidence_threshold,
        }
    }

    /// Register an additional (e.g. accelerated) backend.
    pub fn register_backend<B: DetectorBackend + 'static>(&mut self, backend: B) {
        self.registry.register(backend);
    }

    /// Detect dog-like subjects in a frame.
    ///
    /// Resizes the frame to the backend's fixed input, runs the model, keeps
    /// detections above the confidence threshold whose class is in the
    /// allow-set, and scales boxes back onto the source frame. An empty vec
    /// is a normal outcome, never an error.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let backend = self.registry.select()?;
        let mut backend = backend
            .lock()
            .map_err(|_| anyhow!("detector backend lock poisoned"))?;

        let size = backend.input_size();
        let resized = image::imageops::resize(
            &frame.to_rgb_image()?,
            size,
            size,
            FilterType::Triangle,
        );
        let mut pixels = resized.into_raw();
        // `to_rgb_image` always yields RGB, whatever order the frame holds.
        if backend.expected_order() != ChannelOrder::Rgb {
            for px in pixels.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }

        let raw = backend
            .detect(&pixels, self.confidence_threshold)
            .context("subject detection failed")?;

        let mut detections = Vec::new();
        for d in raw {
            // Model class ids are 1-based; id 0 is the background class.
            let Some(label) = d.class_id.checked_sub(1).and_then(|i| self.class_names.get(i))
            else {
                log::debug!("frame {}: dropping unknown class id {}", frame.index, d.class_id);
                continue;
            };
            if !self.allow_classes.iter().any(|c| c == &label.to_ascii_lowercase()) {
                continue;
            }
            detections.push(Detection {
                class_label: label.clone(),
                confidence: d.confidence,
                bounding_box: BoundingBox {
                    x: (d.x * frame.width() as f32).round() as i32,
                    y: (d.y * frame.height() as f32).round() as i32,
                    width: (d.w * frame.width() as f32).round() as i32,
                    height: (d.h * frame.height() as f32).round() as i32,
                },
            });
        }
        Ok(detections)
    }
}

/// Read a newline-delimited class-name list, skipping blank lines.
pub fn read_class_names(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read class names from {}", path.display()))?;
    let names: Vec<String> = raw
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if names.is_empty() {
        return Err(anyhow!("class name list {} is empty", path.display()));
    }
    Ok(names)
}
