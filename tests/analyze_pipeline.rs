//! End-to-end pipeline runs against a synthetic source and scripted model
//! backends: no model files, no video files, no feature gates.

use pupdex::analyze::ModelService;
use pupdex::classify::backend::ScriptedClassifier;
use pupdex::classify::{BreedClassifier, LabelEncoder, UNDETERMINED};
use pupdex::detect::backends::ScriptedBackend;
use pupdex::detect::{RawDetection, SubjectDetector};
use pupdex::{analyze_video_for_breeds, AnalysisConfig, AnalysisError, LazyModels};

fn coco_like() -> Vec<String> {
    vec!["person".into(), "dog".into(), "horse".into(), "car".into()]
}

fn breeds() -> LabelEncoder {
    LabelEncoder::from_classes(vec![
        "labrador".to_string(),
        "poodle".to_string(),
        "beagle".to_string(),
    ])
    .unwrap()
}

fn dog_at(confidence: f32) -> RawDetection {
    RawDetection {
        class_id: 2,
        confidence,
        x: 0.25,
        y: 0.25,
        w: 0.5,
        h: 0.5,
    }
}

fn test_config(dir: &tempfile::TempDir) -> AnalysisConfig {
    let mut cfg = AnalysisConfig::default();
    cfg.frames_dir = dir.path().join("frames");
    cfg.history_path = dir.path().join("history.json");
    cfg
}

fn models(detector_backend: ScriptedBackend, logits: Vec<f32>) -> LazyModels {
    let detector = SubjectDetector::from_backend(
        detector_backend,
        coco_like(),
        vec!["dog".to_string(), "horse".to_string()],
        0.4,
    );
    let classifier =
        BreedClassifier::from_backend(ScriptedClassifier::new(logits), breeds(), 40.0);
    LazyModels::preloaded(ModelService::new(detector, classifier))
}

#[test]
fn video_with_dogs_yields_ranked_breeds_and_a_representative_frame() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&dir);

    // 12 source frames with stride 5 means three frames reach the detector.
    let backend = ScriptedBackend::new()
        .push_frame(vec![dog_at(0.7)])
        .push_frame(vec![dog_at(0.95)])
        .push_frame(vec![dog_at(0.8)]);
    let models = models(backend, vec![5.0, 3.0, 1.0]);

    let result = analyze_video_for_breeds(&models, "stub://clip?frames=12", &cfg).unwrap();

    assert!(result.error.is_none());
    assert_eq!(result.ranked_breeds.len(), 3);
    assert_eq!(result.ranked_breeds[0].breed, "labrador");
    assert!(result.ranked_breeds[0].is_top);
    assert!(result.ranked_breeds[0].confidence > 80.0);
    assert!(!result.ranked_breeds[1].is_top);
    assert!(result.ranked_breeds[0].confidence >= result.ranked_breeds[1].confidence);

    let frame_path = result.representative_frame_path.expect("frame persisted");
    assert!(frame_path.is_file());
    assert!(frame_path.starts_with(&cfg.frames_dir));
    assert_eq!(frame_path.extension().and_then(|e| e.to_str()), Some("png"));
}

#[test]
fn per_frame_guesses_average_with_stable_tie_order() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&dir);

    // Two classified detections with mirrored logits: labrador dominates
    // the first frame, poodle the second. Their means tie, and labrador
    // keeps first place because it was observed first.
    let backend = ScriptedBackend::new()
        .push_frame(vec![dog_at(0.9)])
        .push_frame(vec![dog_at(0.9)]);
    let detector = SubjectDetector::from_backend(
        backend,
        coco_like(),
        vec!["dog".to_string()],
        0.4,
    );
    let classifier = BreedClassifier::from_backend(
        ScriptedClassifier::new(vec![0.0, 0.0, 5.0])
            .push_call(vec![5.0, 0.0, 0.0])
            .push_call(vec![0.0, 5.0, 0.0]),
        breeds(),
        40.0,
    );
    let models = LazyModels::preloaded(ModelService::new(detector, classifier));

    let result = analyze_video_for_breeds(&models, "stub://clip?frames=12", &cfg).unwrap();

    assert!(result.error.is_none());
    assert_eq!(result.ranked_breeds[0].breed, "labrador");
    assert_eq!(result.ranked_breeds[1].breed, "poodle");
    let diff = result.ranked_breeds[0].confidence - result.ranked_breeds[1].confidence;
    assert!(diff.abs() < 1e-3, "tied means must rank stably, diff {diff}");
    assert_eq!(result.ranked_breeds[2].breed, "beagle");
    assert!(result.ranked_breeds[2].confidence < result.ranked_breeds[1].confidence);
}

#[test]
fn video_without_detections_completes_with_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&dir);
    let models = models(ScriptedBackend::new(), vec![5.0, 3.0, 1.0]);

    let result = analyze_video_for_breeds(&models, "stub://clip?frames=12", &cfg).unwrap();

    assert_eq!(result.error.as_deref(), Some("no dog found"));
    assert_eq!(result.ranked_breeds.len(), 1);
    assert_eq!(result.ranked_breeds[0].breed, UNDETERMINED);
    assert_eq!(result.ranked_breeds[0].confidence, 0.0);
    assert!(result.ranked_breeds[0].is_top);
    assert!(result.representative_frame_path.is_none());
}

#[test]
fn low_confidence_classifications_never_reach_the_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&dir);

    // Detections exist, but uniform logits keep every guess below 40%.
    let backend = ScriptedBackend::new()
        .push_frame(vec![dog_at(0.9)])
        .push_frame(vec![dog_at(0.9)]);
    let models = models(backend, vec![1.0, 1.0, 1.0]);

    let result = analyze_video_for_breeds(&models, "stub://clip?frames=12", &cfg).unwrap();

    assert_eq!(
        result.error.as_deref(),
        Some("no breeds identified with sufficient confidence")
    );
    assert_eq!(result.ranked_breeds[0].breed, UNDETERMINED);
    assert!(result.representative_frame_path.is_none());
}

#[test]
fn mid_stream_decode_failure_keeps_accumulated_results() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&dir);

    // The source dies after six frames; the two frames sampled before the
    // failure (0 and 5) both carry a classified dog.
    let backend = ScriptedBackend::new()
        .push_frame(vec![dog_at(0.8)])
        .push_frame(vec![dog_at(0.9)]);
    let models = models(backend, vec![5.0, 3.0, 1.0]);

    let result =
        analyze_video_for_breeds(&models, "stub://clip?frames=60&fail_after=6", &cfg).unwrap();

    assert!(result.error.is_none());
    assert_eq!(result.ranked_breeds[0].breed, "labrador");
    assert!(result.representative_frame_path.is_some());
}

#[test]
fn unreadable_source_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(&dir);
    let models = models(ScriptedBackend::new(), vec![5.0, 3.0, 1.0]);

    match analyze_video_for_breeds(&models, "", &cfg) {
        Err(AnalysisError::SourceUnavailable(_)) => {}
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[test]
fn frame_budget_caps_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.sampling.max_frames = 1;

    // Only the first sampled frame carries a detection; a second would
    // change the aggregate, proving the budget stopped the run.
    let backend = ScriptedBackend::new()
        .push_frame(vec![dog_at(0.9)])
        .push_frame(vec![dog_at(0.9)]);
    let models = models(backend, vec![5.0, 3.0, 1.0]);

    let result = analyze_video_for_breeds(&models, "stub://clip?frames=600", &cfg).unwrap();
    assert!(result.error.is_none());
    assert_eq!(result.ranked_breeds[0].breed, "labrador");
}
