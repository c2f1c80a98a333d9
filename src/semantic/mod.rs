//! Semantic (embedding-based) search over symbol and file text (spec §4.6).

pub mod cache;

use crate::error::{IndexError, IndexResult};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

static PROVIDER: Mutex<Option<&'static EmbeddingProvider>> = Mutex::new(None);

/// Lazily constructed, process-wide embedding model. Reconstructing it is
/// expensive (loads an ONNX model from disk/cache), so a provider is reused
/// across calls requesting the same `model_id`; a call naming a different
/// `model_id` reconstructs it (spec §4.9 "reconstructable only when the
/// caller requests a different model").
pub struct EmbeddingProvider {
    model_id: String,
    embedder: TextEmbedding,
}

impl EmbeddingProvider {
    pub fn global(model_id: &str) -> IndexResult<&'static EmbeddingProvider> {
        let mut slot = PROVIDER.lock();
        if let Some(existing) = *slot {
            if existing.model_id == model_id {
                return Ok(existing);
            }
            tracing::info!(
                previous = %existing.model_id,
                requested = model_id,
                "embedding model changed; reconstructing provider"
            );
        }

        let model = model_for_name(model_id)?;
        let embedder = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|e| IndexError::EmbeddingError { reason: e.to_string() })?;

        // Leaked deliberately: the slot holds a 'static reference so callers
        // can keep using a provider obtained before a later reconstruction.
        // Models are swapped rarely relative to a process's lifetime.
        let provider: &'static EmbeddingProvider = Box::leak(Box::new(EmbeddingProvider {
            model_id: model_id.to_string(),
            embedder,
        }));
        *slot = Some(provider);
        Ok(provider)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn embed(&self, texts: Vec<String>) -> IndexResult<Vec<Vec<f32>>> {
        self.embedder
            .embed(texts, None)
            .map_err(|e| IndexError::EmbeddingError { reason: e.to_string() })
    }
}

fn model_for_name(name: &str) -> IndexResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        other => Err(IndexError::ConfigError {
            reason: format!("unknown embedding model '{other}'"),
        }),
    }
}

/// Cosine similarity; a zero-norm vector (never embedded, or all-zero) is
/// defined as maximally dissimilar rather than `NaN` (spec §4.6).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }
}
