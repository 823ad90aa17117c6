//! Label vocabulary: one class name per line, index-aligned with the model output.

use crate::error::{InferenceError, InferenceResult};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<String>,
}

impl Vocabulary {
    pub fn load(path: &Path) -> InferenceResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| InferenceError::MissingVocabulary {
            path: path.to_path_buf(),
            source,
        })?;
        let vocab = Self::parse(&text);
        if vocab.is_empty() {
            return Err(InferenceError::EmptyVocabulary(path.to_path_buf()));
        }
        Ok(vocab)
    }

    /// Lines are trimmed; trailing blank lines are dropped so indices stay aligned.
    pub fn parse(text: &str) -> Self {
        let mut labels: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
        while labels.last().is_some_and(|l| l.is_empty()) {
            labels.pop();
        }
        Self { labels }
    }

    pub fn get(&self, index: usize) -> InferenceResult<&str> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(InferenceError::LabelOutOfRange {
                index,
                len: self.labels.len(),
            })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
