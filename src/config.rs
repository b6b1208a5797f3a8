use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::{DEFAULT_MAX_FRAMES, DEFAULT_STRIDE};

const DEFAULT_FRAMES_DIR: &str = "frames";
const DEFAULT_HISTORY_PATH: &str = "analysis_history.json";
const DEFAULT_DETECTOR_WEIGHTS: &str = "model_data/ssd_mobilenet_v3_large.onnx";
const DEFAULT_DETECTOR_TOPOLOGY: &str = "model_data/ssd_mobilenet_v3_large.pbtxt";
const DEFAULT_DETECTOR_CLASSES: &str = "model_data/coco.names";
const DEFAULT_CLASSIFIER_WEIGHTS: &str = "puprecogniser_model/mobilenetv2_tsinghua.onnx";
const DEFAULT_LABEL_ENCODER: &str = "puprecogniser_model/label_encoder.json";
const DEFAULT_DETECTION_THRESHOLD: f32 = 0.4;
const DEFAULT_PADDING_RATIO: f32 = 0.15;
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_CLASSIFICATION_THRESHOLD_PERCENT: f32 = 40.0;

#[derive(Debug, Deserialize, Default)]
struct AnalysisConfigFile {
    frames_dir: Option<PathBuf>,
    history_path: Option<PathBuf>,
    models: Option<ModelPathsFile>,
    sampling: Option<SamplingConfigFile>,
    detection: Option<DetectionConfigFile>,
    classification: Option<ClassificationConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelPathsFile {
    detector_weights: Option<PathBuf>,
    detector_topology: Option<PathBuf>,
    detector_classes: Option<PathBuf>,
    classifier_weights: Option<PathBuf>,
    label_encoder: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SamplingConfigFile {
    max_frames: Option<usize>,
    stride: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    confidence_threshold: Option<f32>,
    allow_classes: Option<Vec<String>>,
    padding_ratio: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassificationConfigFile {
    top_k: Option<usize>,
    confidence_threshold_percent: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub frames_dir: PathBuf,
    pub history_path: PathBuf,
    pub models: ModelPaths,
    pub sampling: SamplingSettings,
    pub detection: DetectionSettings,
    pub classification: ClassificationSettings,
}

#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub detector_weights: PathBuf,
    pub detector_topology: PathBuf,
    pub detector_classes: PathBuf,
    pub classifier_weights: PathBuf,
    pub label_encoder: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SamplingSettings {
    pub max_frames: usize,
    pub stride: u32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub confidence_threshold: f32,
    /// Detector classes treated as a dog-like subject. `horse` ships in the
    /// default set to preserve the trained model's behavior; override it
    /// here or via PUPDEX_ALLOW_CLASSES.
    pub allow_classes: Vec<String>,
    pub padding_ratio: f32,
}

#[derive(Debug, Clone)]
pub struct ClassificationSettings {
    pub top_k: usize,
    pub confidence_threshold_percent: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::from_file(AnalysisConfigFile::default())
    }
}

impl AnalysisConfig {
    /// Load the configuration: JSON file named by PUPDEX_CONFIG (if set),
    /// then env overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PUPDEX_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AnalysisConfigFile) -> Self {
        let models = file.models.unwrap_or_default();
        let sampling = file.sampling.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        let classification = file.classification.unwrap_or_default();
        Self {
            frames_dir: file
                .frames_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FRAMES_DIR)),
            history_path: file
                .history_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH)),
            models: ModelPaths {
                detector_weights: models
                    .detector_weights
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DETECTOR_WEIGHTS)),
                detector_topology: models
                    .detector_topology
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DETECTOR_TOPOLOGY)),
                detector_classes: models
                    .detector_classes
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DETECTOR_CLASSES)),
                classifier_weights: models
                    .classifier_weights
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CLASSIFIER_WEIGHTS)),
                label_encoder: models
                    .label_encoder
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LABEL_ENCODER)),
            },
            sampling: SamplingSettings {
                max_frames: sampling.max_frames.unwrap_or(DEFAULT_MAX_FRAMES),
                stride: sampling.stride.unwrap_or(DEFAULT_STRIDE),
            },
            detection: DetectionSettings {
                confidence_threshold: detection
                    .confidence_threshold
                    .unwrap_or(DEFAULT_DETECTION_THRESHOLD),
                allow_classes: detection
                    .allow_classes
                    .unwrap_or_else(|| vec!["dog".to_string(), "horse".to_string()]),
                padding_ratio: detection.padding_ratio.unwrap_or(DEFAULT_PADDING_RATIO),
            },
            classification: ClassificationSettings {
                top_k: classification.top_k.unwrap_or(DEFAULT_TOP_K),
                confidence_threshold_percent: classification
                    .confidence_threshold_percent
                    .unwrap_or(DEFAULT_CLASSIFICATION_THRESHOLD_PERCENT),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("PUPDEX_FRAMES_DIR") {
            if !dir.trim().is_empty() {
                self.frames_dir = PathBuf::from(dir);
            }
        }
        if let Ok(path) = std::env::var("PUPDEX_HISTORY_PATH") {
            if !path.trim().is_empty() {
                self.history_path = PathBuf::from(path);
            }
        }
        if let Ok(classes) = std::env::var("PUPDEX_ALLOW_CLASSES") {
            let parsed = split_csv(&classes);
            if !parsed.is_empty() {
                self.detection.allow_classes = parsed;
            }
        }
        if let Ok(max_frames) = std::env::var("PUPDEX_MAX_FRAMES") {
            self.sampling.max_frames = max_frames
                .parse()
                .map_err(|_| anyhow!("PUPDEX_MAX_FRAMES must be an integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.sampling.max_frames == 0 {
            return Err(anyhow!("sampling.max_frames must be greater than zero"));
        }
        if self.sampling.stride == 0 {
            return Err(anyhow!("sampling.stride must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(anyhow!("detection.confidence_threshold must be in [0, 1]"));
        }
        if self.detection.allow_classes.is_empty() {
            return Err(anyhow!("detection.allow_classes must not be empty"));
        }
        if self.detection.padding_ratio < 0.0 {
            return Err(anyhow!("detection.padding_ratio must not be negative"));
        }
        if self.classification.top_k == 0 {
            return Err(anyhow!("classification.top_k must be greater than zero"));
        }
        if !(0.0..=100.0).contains(&self.classification.confidence_threshold_percent) {
            return Err(anyhow!(
                "classification.confidence_threshold_percent must be in [0, 100]"
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<AnalysisConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
