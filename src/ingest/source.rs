//! Frame source facade.
//!
//! `FrameSource::open` is the only place a video can fail to start; after a
//! successful open, `next_frame` either yields the next decoded frame or
//! `None` when the source is exhausted.

use anyhow::Result;

use crate::error::AnalysisError;
use crate::frame::Frame;

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;

pub struct FrameSource {
    backend: SourceBackend,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FrameSource {
    /// Open a video source. `stub://name?frames=N` produces a synthetic
    /// clip; anything else is treated as a local file path.
    pub fn open(path: &str) -> Result<Self, AnalysisError> {
        if path.trim().is_empty() {
            return Err(AnalysisError::SourceUnavailable(
                "empty source path".to_string(),
            ));
        }
        if let Some(spec) = path.strip_prefix("stub://") {
            let source = SyntheticSource::parse(spec)
                .map_err(|e| AnalysisError::SourceUnavailable(format!("{path}: {e:#}")))?;
            log::info!("FrameSource: opened {} (synthetic)", path);
            return Ok(Self {
                backend: SourceBackend::Synthetic(source),
            });
        }
        if path.contains("://") {
            return Err(AnalysisError::SourceUnavailable(format!(
                "{path}: only local paths are supported"
            )));
        }

        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            let source = FfmpegFileSource::open(path)
                .map_err(|e| AnalysisError::SourceUnavailable(format!("{path}: {e:#}")))?;
            log::info!("FrameSource: opened {} (ffmpeg)", path);
            Ok(Self {
                backend: SourceBackend::Ffmpeg(source),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(AnalysisError::SourceUnavailable(format!(
                "{path}: file decode requires the ingest-file-ffmpeg feature"
            )))
        }
    }

    /// Read the next frame. `Ok(None)` means the source ran out of frames.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            SourceBackend::Ffmpeg(source) => source.next_frame(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demos
// ----------------------------------------------------------------------------

const SYNTHETIC_WIDTH: u32 = 64;
const SYNTHETIC_HEIGHT: u32 = 48;
const SYNTHETIC_DEFAULT_FRAMES: u64 = 150;

struct SyntheticSource {
    total_frames: u64,
    /// Fail every read from this frame index on (`fail_after=N` in the
    /// query), simulating a stream that goes bad mid-clip.
    fail_after: Option<u64>,
    produced: u64,
}

impl SyntheticSource {
    fn parse(spec: &str) -> Result<Self> {
        let mut total_frames = SYNTHETIC_DEFAULT_FRAMES;
        let mut fail_after = None;
        if let Some((_, query)) = spec.split_once('?') {
            for pair in query.split('&') {
                match pair.split_once('=') {
                    Some(("frames", value)) => {
                        total_frames = value
                            .parse()
                            .map_err(|_| anyhow::anyhow!("frames must be an integer"))?;
                    }
                    Some(("fail_after", value)) => {
                        fail_after = Some(
                            value
                                .parse()
                                .map_err(|_| anyhow::anyhow!("fail_after must be an integer"))?,
                        );
                    }
                    _ => {}
                }
            }
        }
        Ok(Self {
            total_frames,
            fail_after,
            produced: 0,
        })
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(fail_after) = self.fail_after {
            if self.produced >= fail_after {
                return Err(anyhow::anyhow!(
                    "synthetic decode failure at frame {}",
                    self.produced
                ));
            }
        }
        if self.produced >= self.total_frames {
            return Ok(None);
        }
        let pixels = self.generate_pixels();
        let frame = Frame::new(pixels, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, self.produced)?;
        self.produced += 1;
        Ok(Some(frame))
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.produced) % 256) as u8;
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_source_is_finite_and_ordered() {
        let mut source = FrameSource::open("stub://clip?frames=3").unwrap();
        for expected in 0..3u64 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.index, expected);
        }
        assert!(source.next_frame().unwrap().is_none());
        // Exhaustion is stable, not an error.
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn stub_source_can_fail_mid_clip() {
        let mut source = FrameSource::open("stub://clip?frames=10&fail_after=2").unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().is_err());
        // The failure is persistent, like a decoder that went bad.
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn empty_path_is_unavailable() {
        assert!(matches!(
            FrameSource::open("  "),
            Err(AnalysisError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn url_schemes_are_rejected() {
        assert!(matches!(
            FrameSource::open("http://example.com/dog.mp4"),
            Err(AnalysisError::SourceUnavailable(_))
        ));
    }

    #[cfg(not(feature = "ingest-file-ffmpeg"))]
    #[test]
    fn file_paths_need_the_ffmpeg_feature() {
        assert!(matches!(
            FrameSource::open("/no/such/clip.mp4"),
            Err(AnalysisError::SourceUnavailable(_))
        ));
    }
}
