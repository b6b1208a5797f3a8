//! Background execution of a video analysis.
//!
//! The caller spawns the run on a dedicated thread and receives the terminal
//! result exactly once over a single-shot channel, keeping the calling
//! thread (typically a UI or request handler) responsive.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::analyze::{analyze_video_for_breeds, LazyModels, VideoAnalysisResult};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Handle to an in-flight analysis. Dropping it detaches the worker; the
/// run finishes but its result is discarded.
pub struct AnalysisHandle {
    rx: Receiver<Result<VideoAnalysisResult, AnalysisError>>,
    joined: thread::JoinHandle<()>,
}

impl AnalysisHandle {
    /// Block until the analysis terminates.
    pub fn wait(self) -> Result<VideoAnalysisResult, AnalysisError> {
        let outcome = self
            .rx
            .recv()
            .map_err(|_| AnalysisError::WorkerFailed("analysis worker panicked".to_string()))?;
        let _ = self.joined.join();
        outcome
    }

    /// Non-blocking check. `Ok(None)` means the run is still in progress.
    pub fn poll(&self) -> Result<Option<Result<VideoAnalysisResult, AnalysisError>>, AnalysisError> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(AnalysisError::WorkerFailed(
                "analysis worker panicked".to_string(),
            )),
        }
    }
}

/// Run `analyze_video_for_breeds` on a worker thread.
///
/// The models handle is shared by reference-count so the first spawned run
/// pays the load cost and later runs reuse the loaded service.
pub fn spawn_analysis(
    models: std::sync::Arc<LazyModels>,
    path: String,
    cfg: AnalysisConfig,
) -> AnalysisHandle {
    let (tx, rx) = mpsc::sync_channel(1);
    let joined = thread::Builder::new()
        .name("breed-analysis".to_string())
        .spawn(move || {
            let outcome = analyze_video_for_breeds(&models, &path, &cfg);
            // The receiver may already be gone; nothing to do then.
            let _ = tx.send(outcome);
        })
        .expect("spawn analysis worker");
    AnalysisHandle { rx, joined }
}
