//! Video analysis orchestration.
//!
//! `analyze_video_for_breeds` composes the sampler, subject detector, region
//! cropper, breed classifier, aggregator, and representative-frame selector
//! into a single run:
//!
//! `Init -> OpeningSource -> Sampling -> Aggregating -> Finalizing -> Done|Failed`
//!
//! Only initialization can fail the run (`ModelFilesMissing`,
//! `SourceUnavailable`). Per-frame problems are logged and skipped; a run
//! that finds nothing still completes with the sentinel breed list and a
//! descriptive message so the caller can distinguish "no dog found" from a
//! hard failure.

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::aggregate::{PredictionAggregator, RankedBreed};
use crate::classify::{BreedClassifier, BreedGuess, ClassifierArtifacts};
use crate::config::AnalysisConfig;
use crate::crop::crop;
use crate::detect::{DetectorArtifacts, SubjectDetector};
use crate::error::AnalysisError;
use crate::ingest::{FrameSampler, FrameSource};
use crate::select::RepresentativeFrameSelector;

/// The final ranked list never exceeds five breeds, independent of the
/// classifier's per-frame top-k.
pub const RANKED_LIMIT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AnalysisPhase {
    Init,
    OpeningSource,
    Sampling,
    Aggregating,
    Finalizing,
}

/// Terminal output of one video analysis, handed to the caller and to the
/// history sink.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoAnalysisResult {
    pub representative_frame_path: Option<PathBuf>,
    /// Sorted descending by confidence, at most five entries, first entry
    /// flagged `is_top`.
    pub ranked_breeds: Vec<RankedBreed>,
    /// Non-fatal descriptive message ("no dog found", ...). The run itself
    /// still completed when this is set.
    pub error: Option<String>,
}

impl VideoAnalysisResult {
    /// The top breed, unless the run produced only the sentinel.
    pub fn top_breed(&self) -> Option<&RankedBreed> {
        self.ranked_breeds
            .first()
            .filter(|r| r.breed != crate::classify::UNDETERMINED)
    }
}

/// The loaded models, injected into the orchestrator by its caller.
/// Weights are read-only after construction; a video analysis and a
/// single-image classification may use the service concurrently.
pub struct ModelService {
    pub detector: SubjectDetector,
    pub classifier: BreedClassifier,
}

impl ModelService {
    pub fn new(detector: SubjectDetector, classifier: BreedClassifier) -> Self {
        Self {
            detector,
            classifier,
        }
    }

    /// Check all model artifacts are resolvable without loading anything.
    pub fn verify_artifacts(cfg: &AnalysisConfig) -> Result<(), AnalysisError> {
        detector_artifacts(cfg).verify()?;
        classifier_artifacts(cfg).verify()?;
        Ok(())
    }

    /// Load both models from the configured artifact paths.
    #[cfg(feature = "backend-tract")]
    pub fn load(cfg: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::verify_artifacts(cfg)?;
        let detector = SubjectDetector::load(
            &detector_artifacts(cfg),
            cfg.detection.allow_classes.clone(),
            cfg.detection.confidence_threshold,
        )
        .map_err(|e| AnalysisError::ModelFilesMissing(format!("detector unusable: {e:#}")))?;
        let classifier = BreedClassifier::load(
            &classifier_artifacts(cfg),
            cfg.classification.confidence_threshold_percent,
        )
        .map_err(|e| AnalysisError::ModelFilesMissing(format!("classifier unusable: {e:#}")))?;
        Ok(Self::new(detector, classifier))
    }
}

fn detector_artifacts(cfg: &AnalysisConfig) -> DetectorArtifacts {
    DetectorArtifacts {
        weights: cfg.models.detector_weights.clone(),
        topology: cfg.models.detector_topology.clone(),
        class_names: cfg.models.detector_classes.clone(),
    }
}

fn classifier_artifacts(cfg: &AnalysisConfig) -> ClassifierArtifacts {
    ClassifierArtifacts {
        weights: cfg.models.classifier_weights.clone(),
        label_encoder: cfg.models.label_encoder.clone(),
    }
}

type ModelLoader = dyn Fn() -> Result<ModelService, AnalysisError> + Send + Sync;

/// One-time guarded model loading.
///
/// Construction is cheap; the first `get` runs the loader, concurrent
/// callers block until it finishes, and later callers reuse the loaded
/// service without reloading.
pub struct LazyModels {
    cell: OnceCell<ModelService>,
    loader: Option<Box<ModelLoader>>,
}

impl LazyModels {
    pub fn lazy<F>(loader: F) -> Self
    where
        F: Fn() -> Result<ModelService, AnalysisError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Some(Box::new(loader)),
        }
    }

    /// Wrap an already-constructed service (tests and callers that manage
    /// loading themselves).
    pub fn preloaded(service: ModelService) -> Self {
        Self {
            cell: OnceCell::with_value(service),
            loader: None,
        }
    }

    pub fn get(&self) -> Result<&ModelService, AnalysisError> {
        self.cell.get_or_try_init(|| match &self.loader {
            Some(load) => load(),
            None => Err(AnalysisError::ModelFilesMissing(
                "no model loader configured".to_string(),
            )),
        })
    }
}

/// Analyze a video end to end, producing a ranked breed list and a
/// representative frame.
pub fn analyze_video_for_breeds(
    models: &LazyModels,
    path: &str,
    cfg: &AnalysisConfig,
) -> Result<VideoAnalysisResult, AnalysisError> {
    match run_analysis(models, path, cfg) {
        Ok(result) => {
            match (&result.error, result.top_breed()) {
                (None, Some(top)) => log::info!(
                    "analysis of {} done: {} at {:.1}%",
                    path,
                    top.breed,
                    top.confidence
                ),
                _ => log::info!(
                    "analysis of {} done: {}",
                    path,
                    result.error.as_deref().unwrap_or("no distinct breed")
                ),
            }
            Ok(result)
        }
        Err(e) => {
            log::error!("analysis of {} failed: {}", path, e);
            Err(e)
        }
    }
}

fn run_analysis(
    models: &LazyModels,
    path: &str,
    cfg: &AnalysisConfig,
) -> Result<VideoAnalysisResult, AnalysisError> {
    let mut phase = AnalysisPhase::Init;
    let service = models.get()?;

    phase = advance(phase, AnalysisPhase::OpeningSource);
    let source = FrameSource::open(path)?;
    let mut sampler = FrameSampler::new(source, cfg.sampling.max_frames, cfg.sampling.stride);

    phase = advance(phase, AnalysisPhase::Sampling);
    let mut aggregator = PredictionAggregator::new();
    let mut selector = RepresentativeFrameSelector::new();
    let mut detections_seen = false;

    loop {
        let frame = match sampler.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                // A mid-stream decode error ends the usable portion of the
                // video; everything accumulated so far still counts.
                log::warn!("frame read failed after {} frames: {e:#}", sampler.accepted());
                break;
            }
        };

        let detections = match service.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("frame {}: detection failed, skipping: {e:#}", frame.index);
                continue;
            }
        };
        if !detections.is_empty() {
            detections_seen = true;
        }

        for detection in detections {
            let Some(region) = crop(&frame, &detection.bounding_box, cfg.detection.padding_ratio)
            else {
                log::debug!(
                    "frame {}: unusable region for {:?}, skipping detection",
                    frame.index,
                    detection.bounding_box
                );
                continue;
            };
            let guesses = match service.classifier.classify(&region, cfg.classification.top_k) {
                Ok(guesses) => guesses,
                Err(e) => {
                    log::warn!(
                        "frame {}: classification failed, skipping detection: {e:#}",
                        frame.index
                    );
                    continue;
                }
            };
            // Only classifications with a real breed feed the aggregate and
            // make the detection eligible for the representative frame.
            if guesses.iter().any(|g| !g.is_undetermined()) {
                aggregator.observe_all(&guesses);
                selector.offer(&frame, detection.confidence);
            }
        }
    }

    phase = advance(phase, AnalysisPhase::Aggregating);
    let ranked_breeds = aggregator.finalize(RANKED_LIMIT);

    phase = advance(phase, AnalysisPhase::Finalizing);
    let representative_frame_path = match selector.persist(&cfg.frames_dir) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("failed to persist representative frame: {e:#}");
            None
        }
    };
    let error = if aggregator.is_empty() {
        Some(if detections_seen {
            "no breeds identified with sufficient confidence".to_string()
        } else {
            "no dog found".to_string()
        })
    } else {
        None
    };
    let _ = phase;

    Ok(VideoAnalysisResult {
        representative_frame_path,
        ranked_breeds,
        error,
    })
}

fn advance(from: AnalysisPhase, to: AnalysisPhase) -> AnalysisPhase {
    log::debug!("analysis phase {:?} -> {:?}", from, to);
    to
}

/// Classify a single image file (no detector pass). The whole image is
/// treated as the region of interest.
pub fn analyze_image_for_breeds(
    models: &LazyModels,
    path: &std::path::Path,
    cfg: &AnalysisConfig,
) -> Result<Vec<RankedBreed>, AnalysisError> {
    let service = models.get()?;
    if !path.is_file() {
        return Err(AnalysisError::SourceUnavailable(
            path.display().to_string(),
        ));
    }
    let guesses = service
        .classifier
        .classify_file(path, cfg.classification.top_k)
        .map_err(|e| AnalysisError::WorkerFailed(format!("image classification: {e:#}")))?;
    Ok(ranked_from_guesses(&guesses))
}

/// Turn an ordered guess list into ranked entries, flagging the first.
pub fn ranked_from_guesses(guesses: &[BreedGuess]) -> Vec<RankedBreed> {
    guesses
        .iter()
        .enumerate()
        .map(|(i, g)| RankedBreed {
            breed: g.breed.clone(),
            confidence: g.confidence,
            is_top: i == 0,
        })
        .collect()
}
