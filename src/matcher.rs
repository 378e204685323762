//! Group indexing and nearest-neighbor matching.
//!
//! Test cases are partitioned by resolved transaction tag - a record with
//! multiple tags fans out into every one of its groups. Each group of size
//! two or more gets a fresh vector index over its members' embeddings;
//! group boundaries are hard isolation boundaries, indexes are never reused
//! across groups. Singleton groups are similarity-inert.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::Result;
use crate::index::VectorIndex;
use crate::record::TestCase;

/// Neighbors requested per test case before capping at the group size.
pub const MAX_NEIGHBORS: usize = 5;

/// A directed similarity candidate within one transaction group. Indices
/// point into the corpus the matcher was given; deduplication to unordered
/// pairs belongs to the comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub transaction: String,
    pub source: usize,
    pub neighbor: usize,
    pub distance: f32,
}

/// Partition corpus indices by resolved transaction tag (fan-out, not
/// exclusive assignment). Untagged records appear in no group.
pub fn group_by_transaction(corpus: &[TestCase]) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, case) in corpus.iter().enumerate() {
        for tag in case.tags() {
            groups.entry(tag.to_string()).or_default().push(idx);
        }
    }
    groups
}

/// Run the per-group nearest-neighbor search. `embeddings` is aligned with
/// `corpus` by index; `max_neighbors` is capped at the group size.
pub fn find_neighbors(
    corpus: &[TestCase],
    embeddings: &[Vec<f32>],
    dimension: usize,
    max_neighbors: usize,
) -> Result<Vec<Candidate>> {
    debug_assert_eq!(corpus.len(), embeddings.len());

    let groups = group_by_transaction(corpus);
    let mut candidates = Vec::new();

    for (transaction, members) in groups {
        if members.len() <= 1 {
            debug!("Skipping singleton group '{}'", transaction);
            continue;
        }

        // Fresh index per group; never reused.
        let mut index = VectorIndex::new(dimension);
        for &member in &members {
            index.add(embeddings[member].clone())?;
        }

        let k = max_neighbors.min(members.len());
        for (local_pos, &member) in members.iter().enumerate() {
            let hits = index.search(&embeddings[member], k)?;
            for hit in hits {
                if hit.position == local_pos {
                    continue; // self-hit
                }
                candidates.push(Candidate {
                    transaction: transaction.clone(),
                    source: member,
                    neighbor: members[hit.position],
                    distance: hit.distance,
                });
            }
        }
        debug!(
            "Group '{}': {} members, k={}",
            transaction,
            members.len(),
            k
        );
    }

    info!("Neighbor search produced {} directed candidates", candidates.len());
    Ok(candidates)
}
