#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawDetection;
use crate::frame::ChannelOrder;

/// Tract-based backend for the SSD subject-detection model.
///
/// Loads a local ONNX artifact and performs inference on a fixed 320x320
/// input. Pixels are normalized with scale 1/127.5 and per-channel mean
/// 127.5, matching the model's training pipeline, and must arrive in BGR
/// order (the detector's training convention; frames are decoded as RGB).
pub struct TractSsdBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
}

const INPUT_SIZE: u32 = 320;
const PIXEL_MEAN: f32 = 127.5;
const PIXEL_SCALE: f32 = 1.0 / 127.5;

impl TractSsdBackend {
    /// Load the ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = INPUT_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size: INPUT_SIZE,
        })
    }

    fn build_input(&self, pixels: &[u8]) -> Result<Tensor> {
        let size = self.input_size as usize;
        let expected_len = size * size * 3;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} bytes for {}x{} input, received {}",
                expected_len,
                size,
                size,
                pixels.len()
            ));
        }

        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
                let idx = (y * size + x) * 3 + channel;
                (pixels[idx] as f32 - PIXEL_MEAN) * PIXEL_SCALE
            });

        Ok(input.into_tensor())
    }

    /// Parse the postprocessed SSD output tensor: rows of
    /// `[image_id, class_id, score, x1, y1, x2, y2]` with normalized corners.
    fn extract_detections(&self, outputs: TVec<TValue>, threshold: f32) -> Result<Vec<RawDetection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let rows = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let mut detections = Vec::new();
        for row in rows.as_slice().unwrap_or(&[]).chunks_exact(7) {
            let confidence = row[2];
            if !confidence.is_finite() || confidence < threshold {
                continue;
            }
            let (x1, y1, x2, y2) = (row[3], row[4], row[5], row[6]);
            detections.push(RawDetection {
                class_id: row[1] as usize,
                confidence,
                x: x1,
                y: y1,
                w: x2 - x1,
                h: y2 - y1,
            });
        }
        Ok(detections)
    }
}

impl DetectorBackend for TractSsdBackend {
    fn name(&self) -> &'static str {
        "tract-ssd"
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn expected_order(&self) -> ChannelOrder {
        ChannelOrder::Bgr
    }

    fn detect(&mut self, pixels: &[u8], threshold: f32) -> Result<Vec<RawDetection>> {
        let input = self.build_input(pixels)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_detections(outputs, threshold)
    }
}
