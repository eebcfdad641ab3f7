//! Embedding provider seam for the semantic comparator.
//!
//! The engine depends only on [`EmbeddingProvider`]; a real service plugs in
//! by implementing `embed` (and optionally `embed_batch` to bound
//! round-trips). [`LocalHashEmbedder`] is the deterministic, offline default:
//! a token feature-hash projection into a fixed-dimension l2-normalized
//! vector.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use thiserror::Error;

pub const DEFAULT_EMBEDDING_DIM: usize = 384;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
}

pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Dot product over l2-normalized vectors. Mismatched or empty inputs score
/// zero rather than erroring; the caller degrades the comparison.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    left.iter()
        .zip(right.iter())
        .map(|(left_value, right_value)| f64::from(*left_value) * f64::from(*right_value))
        .sum::<f64>()
}

#[derive(Debug, Clone)]
pub struct LocalHashEmbedder {
    dimensions: usize,
}

impl LocalHashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(8),
        }
    }
}

impl Default for LocalHashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for LocalHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0_f32; self.dimensions];
        let features = tokenize_features(text);

        for feature in &features {
            let hash = stable_hash(feature);
            let index = (hash as usize) % self.dimensions;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            let magnitude = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
            vector[index] += sign * magnitude;
        }

        normalize_vector(&mut vector);
        Ok(vector)
    }
}

/// Always-failing provider, used to exercise the degradation path in tests.
#[derive(Debug, Clone, Default)]
pub struct UnavailableEmbedder;

impl EmbeddingProvider for UnavailableEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("provider disabled".to_string()))
    }
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Unigram + bigram features over lowercased alphanumeric words.
fn tokenize_features(text: &str) -> Vec<String> {
    let words = text
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|character| character.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<String>>();

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    if norm == 0.0 {
        return;
    }

    for value in values {
        *value /= norm;
    }
}
