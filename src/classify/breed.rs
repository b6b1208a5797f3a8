//! Breed classifier adapter.
//!
//! Wraps a classifier backend with preprocessing, softmax, top-k selection,
//! and the below-threshold sentinel: a top guess under the confidence
//! threshold invalidates the whole top-k list, not just the first entry.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};

use crate::classify::backend::ClassifierBackend;
use crate::classify::labels::LabelEncoder;
use crate::classify::preprocess::preprocess;
use crate::crop::CroppedRegion;
use crate::error::AnalysisError;
use crate::frame::ChannelOrder;

pub const UNDETERMINED: &str = "Undetermined";

pub const DEFAULT_CONFIDENCE_THRESHOLD_PERCENT: f32 = 40.0;

/// One ranked guess from the classifier. Confidence is a percentage.
#[derive(Clone, Debug, PartialEq)]
pub struct BreedGuess {
    pub breed: String,
    pub confidence: f32,
}

impl BreedGuess {
    pub fn undetermined() -> Self {
        Self {
            breed: UNDETERMINED.to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_undetermined(&self) -> bool {
        self.breed == UNDETERMINED
    }
}

/// On-disk artifacts of the breed classifier: weights plus the serialized
/// label encoder.
#[derive(Clone, Debug)]
pub struct ClassifierArtifacts {
    pub weights: PathBuf,
    pub label_encoder: PathBuf,
}

impl ClassifierArtifacts {
    pub fn verify(&self) -> Result<(), AnalysisError> {
        let missing: Vec<String> = [&self.weights, &self.label_encoder]
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

pub struct BreedClassifier {
    // Interior mutex: loaded weights are read-only and `classify` takes
    // `&self`, so a video run and a single-image call may overlap safely.
    backend: Mutex<Box<dyn ClassifierBackend>>,
    labels: LabelEncoder,
    confidence_threshold_percent: f32,
}

impl BreedClassifier {
    /// Load the classifier from disk artifacts (tract backend).
    #[cfg(feature = "backend-tract")]
    pub fn load(
        artifacts: &ClassifierArtifacts,
        confidence_threshold_percent: f32,
    ) -> Result<Self> {
        artifacts.verify()?;
        let labels = LabelEncoder::load(&artifacts.label_encoder)?;
        let backend = crate::classify::backend::TractClassifierBackend::new(&artifacts.weights)?;
        Ok(Self::from_backend(
            backend,
            labels,
            confidence_threshold_percent,
        ))
    }

    /// Build the adapter around an already-constructed backend.
    pub fn from_backend<B: ClassifierBackend + 'static>(
        backend: B,
        labels: LabelEncoder,
        confidence_threshold_percent: f32,
    ) -> Self {
        Self {
            backend: Mutex::new(Box::new(backend)),
            labels,
            confidence_threshold_percent,
        }
    }

    /// Classify a cropped region into a ranked top-k list.
    ///
    /// Returns exactly `min(k, classes)` guesses ordered by descending
    /// confidence, or the single `Undetermined` sentinel when the best guess
    /// falls below the confidence threshold.
    pub fn classify(&self, region: &CroppedRegion, k: usize) -> Result<Vec<BreedGuess>> {
        if k == 0 {
            return Err(anyhow!("top-k must be at least 1"));
        }
        let input = preprocess(region)?;
        let logits = {
            let mut backend = self
                .backend
                .lock()
                .map_err(|_| anyhow!("classifier backend lock poisoned"))?;
            backend.infer(&input).context("breed inference failed")?
        };
        if logits.len() != self.labels.len() {
            return Err(anyhow!(
                "model produced {} scores but label encoder has {} classes",
                logits.len(),
                self.labels.len()
            ));
        }

        let probabilities = softmax(&logits);
        let mut ranked: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        let top_percent = ranked.first().map(|(_, p)| p * 100.0).unwrap_or(0.0);
        if top_percent < self.confidence_threshold_percent {
            return Ok(vec![BreedGuess::undetermined()]);
        }

        ranked
            .into_iter()
            .map(|(index, probability)| {
                let breed = self
                    .labels
                    .class(index)
                    .ok_or_else(|| anyhow!("label encoder does not cover class {}", index))?;
                Ok(BreedGuess {
                    breed: breed.to_string(),
                    confidence: probability * 100.0,
                })
            })
            .collect()
    }

    /// Classify a whole image file (the single-image analysis path).
    pub fn classify_file(&self, path: &Path, k: usize) -> Result<Vec<BreedGuess>> {
        let img = image::open(path)
            .with_context(|| format!("failed to open image {}", path.display()))?
            .to_rgb8();
        let region = CroppedRegion {
            width: img.width(),
            height: img.height(),
            pixels: img.into_raw(),
            order: ChannelOrder::Rgb,
        };
        self.classify(&region, k)
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::backend::ScriptedClassifier;

    fn labels() -> LabelEncoder {
        LabelEncoder::from_classes(vec![
            "labrador_retriever".into(),
            "poodle".into(),
            "beagle".into(),
        ])
        .unwrap()
    }

    fn region() -> CroppedRegion {
        CroppedRegion {
            pixels: vec![100; 32 * 32 * 3],
            width: 32,
            height: 32,
            order: ChannelOrder::Rgb,
        }
    }

    #[test]
    fn ranks_top_k_by_probability() {
        // Logits heavily favouring class 0; softmax keeps the order.
        let classifier = BreedClassifier::from_backend(
            ScriptedClassifier::new(vec![5.0, 3.0, 1.0]),
            labels(),
            DEFAULT_CONFIDENCE_THRESHOLD_PERCENT,
        );
        let guesses = classifier.classify(&region(), 2).unwrap();
        assert_eq!(guesses.len(), 2);
        assert_eq!(guesses[0].breed, "labrador_retriever");
        assert_eq!(guesses[1].breed, "poodle");
        assert!(guesses[0].confidence > guesses[1].confidence);
        assert!(guesses[0].confidence > DEFAULT_CONFIDENCE_THRESHOLD_PERCENT);
    }

    #[test]
    fn below_threshold_top_collapses_to_sentinel() {
        // Equal logits: every probability is ~33.3%, under the 40% threshold.
        let classifier = BreedClassifier::from_backend(
            ScriptedClassifier::new(vec![1.0, 1.0, 1.0]),
            labels(),
            DEFAULT_CONFIDENCE_THRESHOLD_PERCENT,
        );
        for k in [1, 2, 3] {
            let guesses = classifier.classify(&region(), k).unwrap();
            assert_eq!(guesses, vec![BreedGuess::undetermined()], "k = {k}");
        }
    }

    #[test]
    fn k_larger_than_class_count_is_truncated() {
        let classifier = BreedClassifier::from_backend(
            ScriptedClassifier::new(vec![9.0, 0.0, 0.0]),
            labels(),
            DEFAULT_CONFIDENCE_THRESHOLD_PERCENT,
        );
        let guesses = classifier.classify(&region(), 10).unwrap();
        assert_eq!(guesses.len(), 3);
    }

    #[test]
    fn verify_reports_every_missing_artifact_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ClassifierArtifacts {
            weights: dir.path().join("model.onnx"),
            label_encoder: dir.path().join("label_encoder.json"),
        };

        match artifacts.verify() {
            Err(AnalysisError::ModelFilesMissing(missing)) => {
                assert!(missing.contains("model.onnx"));
                assert!(missing.contains("label_encoder.json"));
            }
            other => panic!("expected ModelFilesMissing, got {other:?}"),
        }
    }

    #[test]
    fn score_and_label_count_must_agree() {
        let classifier = BreedClassifier::from_backend(
            ScriptedClassifier::new(vec![1.0, 2.0]),
            labels(),
            DEFAULT_CONFIDENCE_THRESHOLD_PERCENT,
        );
        assert!(classifier.classify(&region(), 1).is_err());
    }
}
