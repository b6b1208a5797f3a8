//! Fatal analysis failures.
//!
//! Only initialization-time failures (and a worker panic) abort a whole
//! analysis run. Everything that can go wrong per frame or per detection is
//! logged and skipped inside the orchestrator instead of surfacing here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// One or more model artifact files could not be resolved on disk.
    /// Reported before any frame is read; never retried.
    #[error("model files missing: {0}")]
    ModelFilesMissing(String),

    /// The video could not be opened at all. Distinct from a source simply
    /// running out of frames, which is normal termination.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The worker thread died without delivering a result.
    #[error("analysis worker failed: {0}")]
    WorkerFailed(String),
}
