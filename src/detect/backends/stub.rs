use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawDetection;
use crate::frame::ChannelOrder;

/// Stub backend for tests. Replays a script of per-frame detections.
///
/// Each call to `detect` pops the next scripted frame; once the script is
/// exhausted every further call reports nothing. Scripted detections below
/// the requested threshold are filtered out like a real backend would.
pub struct ScriptedBackend {
    script: VecDeque<Vec<RawDetection>>,
    accelerated: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            accelerated: false,
        }
    }

    /// Queue one frame's worth of raw detections.
    pub fn push_frame(mut self, detections: Vec<RawDetection>) -> Self {
        self.script.push_back(detections);
        self
    }

    /// Pretend to run on an accelerated target (registry selection tests).
    pub fn with_accelerated(mut self, accelerated: bool) -> Self {
        self.accelerated = accelerated;
        self
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn accelerated(&self) -> bool {
        self.accelerated
    }

    fn input_size(&self) -> u32 {
        320
    }

    fn expected_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn detect(&mut self, _pixels: &[u8], threshold: f32) -> Result<Vec<RawDetection>> {
        let frame = self.script.pop_front().unwrap_or_default();
        Ok(frame
            .into_iter()
            .filter(|d| d.confidence >= threshold)
            .collect())
    }
}
