//! Error types for the inference flow

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for classifier operations
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Each failure mode of `classify` gets its own variant.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Label vocabulary not found at {path}: {source}")]
    MissingVocabulary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Label vocabulary {0} is empty")]
    EmptyVocabulary(PathBuf),

    #[error("Could not decode image: {0}")]
    BadImage(#[from] image::ImageError),

    #[error("Failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model predicted class {index} but the vocabulary has {len} labels")]
    LabelOutOfRange { index: usize, len: usize },
}
