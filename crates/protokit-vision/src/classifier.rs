//! Classifier — pretrained ONNX image model + label vocabulary.
//! One forward pass, argmax over the logits, one label back. No top-k, no threshold.

use crate::error::{InferenceError, InferenceResult};
use crate::preprocess::ImagePreprocessor;
use crate::vocabulary::Vocabulary;
use std::path::Path;
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub struct Classifier {
    plan: Plan,
    vocabulary: Vocabulary,
    preprocessor: ImagePreprocessor,
}

impl Classifier {
    /// Load the vocabulary and the ONNX model. Vocabulary problems surface before the
    /// (slower) model load.
    pub fn load(model_path: &Path, labels_path: &Path) -> InferenceResult<Self> {
        let vocabulary = Vocabulary::load(labels_path)?;
        let preprocessor = ImagePreprocessor::default();
        let size = preprocessor.crop as usize;

        tracing::info!("[VISION] Loading model {}", model_path.display());
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| InferenceError::ModelLoad {
                path: model_path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Self {
            plan,
            vocabulary,
            preprocessor,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Label for encoded image bytes, verbatim from the vocabulary.
    pub fn classify(&self, image_bytes: &[u8]) -> InferenceResult<String> {
        let input: Tensor = self.preprocessor.from_bytes(image_bytes)?.into();
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Inference(e.to_string()))?;
        let logits = outputs
            .first()
            .ok_or_else(|| InferenceError::Inference("model produced no output".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Inference(e.to_string()))?;

        let index = argmax(logits.iter().copied())
            .ok_or_else(|| InferenceError::Inference("empty logits".to_string()))?;
        let label = self.vocabulary.get(index)?.to_string();
        tracing::info!("[VISION] Predicted class {} ({})", index, label);
        Ok(label)
    }
}

/// Load model + vocabulary and classify a single image. Nothing is cached between calls.
pub fn classify(model_path: &Path, labels_path: &Path, image_bytes: &[u8]) -> InferenceResult<String> {
    Classifier::load(model_path, labels_path)?.classify(image_bytes)
}

/// Index of the largest finite value; the first one wins ties.
pub fn argmax(values: impl IntoIterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
