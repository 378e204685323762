//! Flat L2 vector index.
//!
//! Exact nearest-neighbor search over a small in-memory set of vectors,
//! scoped to one transaction group and discarded afterwards. Results are
//! deterministic: ties on distance break by insertion position.

use tracing::trace;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// One nearest-neighbor hit: index of the stored vector and its squared
/// Euclidean distance is not used - distances are true Euclidean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add a vector. Rejects vectors whose dimension differs from the
    /// index's; mixed-dimension search results are meaningless.
    pub fn add(&mut self, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// The k nearest stored vectors to the query by Euclidean distance,
    /// ascending. Includes the query's own stored copy if present; callers
    /// discard self-hits. Searching an empty index is fatal for the
    /// operation.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.vectors.is_empty() {
            return Err(PipelineError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: euclidean_distance(query, vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.position.cmp(&b.position))
        });
        hits.truncate(k);
        trace!("Index search returned {} neighbors", hits.len());
        Ok(hits)
    }
}

/// Euclidean distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_orders_by_distance() {
        let mut index = VectorIndex::new(2);
        index.add(vec![0.0, 0.0]).unwrap();
        index.add(vec![3.0, 4.0]).unwrap();
        index.add(vec![1.0, 0.0]).unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].position, 2);
        assert_eq!(hits[2].position, 1);
        assert!((hits[2].distance - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_k_truncates() {
        let mut index = VectorIndex::new(1);
        for x in 0..10 {
            index.add(vec![x as f32]).unwrap();
        }
        let hits = index.search(&[0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_ties_break_by_insertion_position() {
        let mut index = VectorIndex::new(1);
        index.add(vec![1.0]).unwrap();
        index.add(vec![-1.0]).unwrap();
        let hits = index.search(&[0.0], 2).unwrap();
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn test_empty_index_search_is_fatal() {
        let index = VectorIndex::new(4);
        let result = index.search(&[0.0; 4], 1);
        assert!(matches!(result, Err(PipelineError::EmptyIndex)));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = VectorIndex::new(4);
        assert!(index.add(vec![0.0; 3]).is_err());
        index.add(vec![0.0; 4]).unwrap();
        assert!(index.search(&[0.0; 3], 1).is_err());
    }
}
