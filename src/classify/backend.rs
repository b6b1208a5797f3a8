use std::collections::VecDeque;

use anyhow::Result;

use crate::classify::preprocess::{CROP_SIZE, INPUT_LEN};

/// Classifier backend trait.
///
/// Receives a normalized CHW `3 x 224 x 224` tensor and returns one logit
/// per breed class. Softmax and thresholding happen in the adapter so every
/// backend reports comparable values.
pub trait ClassifierBackend: Send {
    fn name(&self) -> &'static str;

    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>>;
}

/// Tract-based backend for the breed-classification model (ONNX).
#[cfg(feature = "backend-tract")]
pub struct TractClassifierBackend {
    model: tract_onnx::prelude::SimplePlan<
        tract_onnx::prelude::TypedFact,
        Box<dyn tract_onnx::prelude::TypedOp>,
    >,
}

#[cfg(feature = "backend-tract")]
impl TractClassifierBackend {
    pub fn new<P: AsRef<std::path::Path>>(model_path: P) -> Result<Self> {
        use anyhow::Context;
        use tract_onnx::prelude::*;

        let model_path = model_path.as_ref();
        let side = CROP_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        Ok(Self { model })
    }
}

#[cfg(feature = "backend-tract")]
impl ClassifierBackend for TractClassifierBackend {
    fn name(&self) -> &'static str {
        "tract-classifier"
    }

    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        use anyhow::{anyhow, Context};
        use tract_onnx::prelude::*;

        if input.len() != INPUT_LEN {
            return Err(anyhow!(
                "expected {} input values, received {}",
                INPUT_LEN,
                input.len()
            ));
        }
        let side = CROP_SIZE as usize;
        let tensor = tract_ndarray::Array4::from_shape_vec((1, 3, side, side), input.to_vec())
            .context("classifier input tensor shape mismatch")?
            .into_tensor();
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .context("ONNX inference failed")?;
        let logits = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(logits.iter().copied().collect())
    }
}

/// Stub classifier for tests. Replays scripted logit vectors; once the
/// script is exhausted it keeps returning the last vector.
pub struct ScriptedClassifier {
    script: VecDeque<Vec<f32>>,
    last: Vec<f32>,
}

impl ScriptedClassifier {
    pub fn new(logits: Vec<f32>) -> Self {
        Self {
            script: VecDeque::new(),
            last: logits,
        }
    }

    pub fn push_call(mut self, logits: Vec<f32>) -> Self {
        self.script.push_back(logits);
        self
    }
}

impl ClassifierBackend for ScriptedClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn infer(&mut self, _input: &[f32]) -> Result<Vec<f32>> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last.clone())
    }
}
