//! Frame sampling.
//!
//! Bounds the total work of a video analysis: at most `max_frames` frames
//! are accepted, taking the first frame and then one of every `stride`
//! source frames, in original temporal order. The sequence is lazy, finite,
//! and non-restartable.

use anyhow::Result;

use crate::frame::Frame;

use super::source::FrameSource;

pub const DEFAULT_MAX_FRAMES: usize = 90;
pub const DEFAULT_STRIDE: u32 = 5;

pub struct FrameSampler {
    source: FrameSource,
    max_frames: usize,
    stride: u64,
    seen: u64,
    accepted: usize,
}

impl FrameSampler {
    pub fn new(source: FrameSource, max_frames: usize, stride: u32) -> Self {
        Self {
            source,
            max_frames,
            stride: stride.max(1) as u64,
            seen: 0,
            accepted: 0,
        }
    }

    /// Yield the next accepted frame, re-indexed by its position in the
    /// sampled sequence. `Ok(None)` when the budget is reached or the source
    /// is exhausted, whichever comes first.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        while self.accepted < self.max_frames {
            let Some(mut frame) = self.source.next_frame()? else {
                return Ok(None);
            };
            let accept = self.seen % self.stride == 0;
            self.seen += 1;
            if !accept {
                continue;
            }
            frame.index = self.accepted as u64;
            self.accepted += 1;
            return Ok(Some(frame));
        }
        Ok(None)
    }

    /// Frames accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted
    }
}
