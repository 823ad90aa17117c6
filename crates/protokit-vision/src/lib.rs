//! ProtoKit Vision — image classification with a pretrained ONNX model.
//!
//! `ImagePreprocessor` → `Classifier` → label string.

pub mod classifier;
pub mod error;
pub mod preprocess;
pub mod vocabulary;

pub use classifier::{argmax, classify, Classifier};
pub use error::{InferenceError, InferenceResult};
pub use preprocess::ImagePreprocessor;
pub use vocabulary::Vocabulary;
