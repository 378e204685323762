//! Result merging.
//!
//! Left-joins comparison pairs with containment verdicts on the identifier
//! pair. Rows without a verdict get displayable defaults (not contained,
//! zero scores) rather than nulls, so every output row has a complete shape.

use std::collections::HashMap;

use crate::record::{pair_key, ComparisonPair, ContainmentVerdict, MergedPair};

pub fn merge_results(
    pairs: &[ComparisonPair],
    verdicts: &[ContainmentVerdict],
) -> Vec<MergedPair> {
    let by_pair: HashMap<(String, String), &ContainmentVerdict> = verdicts
        .iter()
        .map(|v| (pair_key(&v.case_a, &v.case_b), v))
        .collect();

    pairs
        .iter()
        .map(|pair| {
            let verdict = by_pair.get(&pair_key(&pair.case_a, &pair.case_b));
            MergedPair {
                transaction: pair.transaction.clone(),
                case_a: pair.case_a.clone(),
                case_b: pair.case_b.clone(),
                distance: pair.distance,
                similarity: pair.similarity,
                differences: pair.differences.clone(),
                contained: verdict.map_or(false, |v| v.contained),
                jaccard: verdict.map_or(0.0, |v| v.jaccard),
                containment_distance: verdict.map_or(0.0, |v| v.distance),
                feedback: String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pair(a: &str, b: &str) -> ComparisonPair {
        ComparisonPair {
            transaction: "WT".to_string(),
            case_a: a.to_string(),
            case_b: b.to_string(),
            distance: 0.2,
            similarity: 0.8333,
            differences: BTreeMap::new(),
        }
    }

    #[test]
    fn test_left_join_keeps_every_pair() {
        let pairs = vec![pair("TC-1", "TC-2"), pair("TC-3", "TC-4")];
        let verdicts = vec![ContainmentVerdict {
            case_a: "TC-1".to_string(),
            case_b: "TC-2".to_string(),
            contained: true,
            jaccard: 0.75,
            distance: 0.1,
        }];
        let merged = merge_results(&pairs, &verdicts);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_absent_verdict_defaults_displayable() {
        let merged = merge_results(&[pair("TC-1", "TC-2")], &[]);
        assert!(!merged[0].contained);
        assert_eq!(merged[0].jaccard, 0.0);
        assert_eq!(merged[0].containment_distance, 0.0);
        assert_eq!(merged[0].feedback, "");
    }

    #[test]
    fn test_join_is_order_insensitive_on_identifiers() {
        let pairs = vec![pair("TC-2", "TC-1")];
        let verdicts = vec![ContainmentVerdict {
            case_a: "TC-1".to_string(),
            case_b: "TC-2".to_string(),
            contained: true,
            jaccard: 0.6,
            distance: 0.3,
        }];
        let merged = merge_results(&pairs, &verdicts);
        assert!(merged[0].contained);
        assert_eq!(merged[0].jaccard, 0.6);
    }
}
