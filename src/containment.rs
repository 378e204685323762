//! Containment refinement.
//!
//! Applies to pairs whose metadata diff shows the profile field present on
//! one side and blank on the other - the signal that one case may be a
//! stripped-down duplicate of the other. For each such pair the word-set
//! Jaccard similarity of the two processed step texts decides containment;
//! the embedding distance between the step texts is reported for audit but
//! is not a gate.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::embedding::EmbeddingProvider;
use crate::index::euclidean_distance;
use crate::record::{ComparisonPair, ContainmentVerdict, TestCase};

/// Jaccard score at or above which a pair is marked contained. The boundary
/// is inclusive: exactly 0.5 is contained.
pub const DEFAULT_JACCARD_THRESHOLD: f64 = 0.5;

/// Metadata field whose one-sided absence triggers refinement.
pub const DEFAULT_CONTAINMENT_FIELD: &str = "Profile";

/// Word-set Jaccard similarity: |intersection| / |union| over lower-cased,
/// whitespace-tokenized words. Two empty texts score 0.
pub fn jaccard_similarity(text_a: &str, text_b: &str) -> f64 {
    let set_a: std::collections::HashSet<String> =
        text_a.to_lowercase().split_whitespace().map(String::from).collect();
    let set_b: std::collections::HashSet<String> =
        text_b.to_lowercase().split_whitespace().map(String::from).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

/// True when the pair's diff shows the containment field present on exactly
/// one side. Diff values have the shape "valueA:valueB" with absent sides
/// stringified to "".
pub fn has_one_sided_field(pair: &ComparisonPair, field: &str) -> bool {
    match pair.differences.get(field) {
        Some(value) => value.starts_with(':') || value.ends_with(':'),
        None => false,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

/// Refine the gated subset of pairs against the corpus. Pairs whose test
/// cases cannot be found on either side are skipped, not defaulted. Step
/// texts that fail to embed degrade to a zero vector (distance is audit
/// only), never abort the batch.
pub fn refine(
    pairs: &[ComparisonPair],
    corpus: &[TestCase],
    provider: &Arc<dyn EmbeddingProvider>,
    jaccard_threshold: f64,
    containment_field: &str,
) -> Vec<ContainmentVerdict> {
    let by_id: HashMap<&str, &TestCase> =
        corpus.iter().map(|case| (case.id.as_str(), case)).collect();

    let mut verdicts = Vec::new();
    for pair in pairs {
        if !has_one_sided_field(pair, containment_field) {
            continue;
        }
        let (case_a, case_b) = match (by_id.get(pair.case_a.as_str()), by_id.get(pair.case_b.as_str())) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                warn!(
                    "Skipping containment check for ({}, {}): test case missing from corpus",
                    pair.case_a, pair.case_b
                );
                continue;
            }
        };

        let jaccard = jaccard_similarity(&case_a.processed_steps, &case_b.processed_steps);
        let distance = step_distance(provider, case_a, case_b);
        let contained = jaccard >= jaccard_threshold;
        debug!(
            "Containment ({}, {}): jaccard {:.3}, distance {:.3}",
            pair.case_a, pair.case_b, jaccard, distance
        );

        verdicts.push(ContainmentVerdict {
            case_a: pair.case_a.clone(),
            case_b: pair.case_b.clone(),
            contained,
            jaccard: round3(jaccard),
            distance: round3(distance),
        });
    }

    info!("Containment refinement produced {} verdicts", verdicts.len());
    verdicts
}

fn step_distance(provider: &Arc<dyn EmbeddingProvider>, a: &TestCase, b: &TestCase) -> f64 {
    let embed_or_zero = |case: &TestCase| -> Vec<f32> {
        if case.processed_steps.trim().is_empty() {
            return vec![0.0; provider.dimension()];
        }
        match provider.embed(&case.processed_steps) {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Embedding failed for step text of {}: {}", case.id, e);
                vec![0.0; provider.dimension()]
            }
        }
    };
    let va = embed_or_zero(a);
    let vb = embed_or_zero(b);
    f64::from(euclidean_distance(&va, &vb))
}
