//! Video frame ingestion.
//!
//! A `FrameSource` opens a video and yields decoded RGB frames sequentially;
//! the `FrameSampler` wraps one and enforces the frame budget and stride.
//!
//! Sources:
//! - `stub://` synthetic clips, always available (tests, demos)
//! - local video files, decoded with FFmpeg (feature: ingest-file-ffmpeg)
//!
//! Reading a frame is a blocking call; nothing is buffered ahead. Running
//! out of frames is normal termination, not an error. Only failing to open
//! the source at all is.

#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod sampler;
pub mod source;

pub use sampler::{FrameSampler, DEFAULT_MAX_FRAMES, DEFAULT_STRIDE};
pub use source::FrameSource;
