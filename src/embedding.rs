//! Embedding provider port.
//!
//! The core never talks to a model directly; it goes through this narrow
//! request/response trait so the real provider can be swapped for a
//! deterministic double in tests. Vectors must have a fixed dimension for
//! the lifetime of a run; embeddings from different providers or dimensions
//! must never be mixed in one index.

use anyhow::Result;

use crate::record::TestCase;

/// Vector dimension of the reference sentence-embedding model.
pub const DEFAULT_DIMENSION: usize = 384;

pub trait EmbeddingProvider: Send + Sync {
    /// Map a text string to a fixed-dimension vector. Pure function from
    /// the core's perspective.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension of every vector this provider produces.
    fn dimension(&self) -> usize;
}

/// Embedding input for a test case: the combined text mirrors what the
/// reference corpus indexed per record.
pub fn combined_text(case: &TestCase) -> String {
    format!(
        "Test ID:{} Description:{} Transaction:{} Steps: {}",
        case.id, case.description, case.transactions, case.processed_steps
    )
}

/// Deterministic offline provider: token-hash bag-of-words vectors. Not a
/// semantic model; it makes identical texts identical vectors and shared
/// vocabulary nearby vectors, which is enough for the CLI default and the
/// test suite. Real deployments implement [`EmbeddingProvider`] against
/// their model service.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let slot = fnv1a(token) as usize % self.dimension;
            vector[slot] += 1.0;
        }
        // L2-normalize non-empty vectors so distances stay comparable
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
