//! pupdex: dog-breed identification from video and still images.
//!
//! The pipeline samples frames from a video source, finds dog-like subjects
//! with an SSD detector, crops each detection with padding, classifies the
//! crop with a breed model, and aggregates per-frame guesses into one ranked
//! list plus a representative frame. Model inference sits behind backend
//! traits so the heavy `tract` and `ffmpeg` dependencies stay feature-gated
//! and the whole pipeline is testable with scripted backends and `stub://`
//! synthetic sources.

pub mod aggregate;
pub mod analyze;
pub mod classify;
pub mod config;
pub mod crop;
pub mod detect;
pub mod error;
pub mod frame;
pub mod history;
pub mod ingest;
pub mod select;
pub mod sweep;
pub mod worker;

pub use aggregate::{PredictionAggregator, RankedBreed};
pub use analyze::{
    analyze_image_for_breeds, analyze_video_for_breeds, LazyModels, ModelService,
    VideoAnalysisResult,
};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use history::{AnalysisKind, HistoryEntry, HistoryStore};
pub use worker::{spawn_analysis, AnalysisHandle};

/// Milliseconds since the Unix epoch, used to name persisted frames.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Turn a raw class label into a display name: underscores become spaces
/// and each word is capitalized (`german_shepherd` -> `German Shepherd`).
pub fn format_breed_name(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_breed_names_for_display() {
        assert_eq!(format_breed_name("german_shepherd"), "German Shepherd");
        assert_eq!(format_breed_name("beagle"), "Beagle");
        assert_eq!(format_breed_name("CHOW_CHOW"), "Chow Chow");
        assert_eq!(format_breed_name(""), "");
    }

    #[test]
    fn now_ms_is_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
        assert!(a > 1_600_000_000_000);
    }
}
