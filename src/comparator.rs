//! Pairwise comparison.
//!
//! Deduplicates directed neighbor candidates to unordered pairs (at most one
//! pair per transaction tag; the first-encountered direction wins), scores
//! them, and diffs their metadata. Fields in the exclusion set are skipped -
//! their differences are expected or uninformative.

use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::matcher::Candidate;
use crate::record::{pair_key, ComparisonPair, TestCase};

/// Metadata fields skipped during the diff: identifiers, free text, raw and
/// derived step text, and the condition/transaction/count columns.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &[
    "Subject",
    "test_case_id",
    "Test Name",
    "Pre-Condition",
    "Description",
    "No of Steps",
    "Designer",
    "Type",
    "Major Functional Area",
    "Business Unit",
    "test_steps",
    "Remaining",
    "Transactions",
    "Transaction_Count",
    "Condition",
    "Processed_Steps",
];

/// Similarity score from vector distance: 1 / (1 + d). Monotonically
/// decreasing in distance, bounded in (0, 1].
pub fn similarity_score(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}

/// Round to four decimal places, matching the report precision.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Diff the open metadata of two records: "valueA:valueB" for every
/// non-excluded field present on either side whose stringified values
/// differ. Fields equal or absent on both sides are omitted.
pub fn compare_metadata(
    a: &TestCase,
    b: &TestCase,
    excluded_fields: &HashSet<String>,
) -> BTreeMap<String, String> {
    let mut differences = BTreeMap::new();
    let fields: HashSet<&String> = a.metadata.keys().chain(b.metadata.keys()).collect();
    for field in fields {
        if excluded_fields.contains(field.as_str()) {
            continue;
        }
        let val_a = a.metadata_str(field);
        let val_b = b.metadata_str(field);
        if val_a != val_b {
            differences.insert(field.clone(), format!("{}:{}", val_a, val_b));
        }
    }
    differences
}

/// Reduce directed candidates to scored, diffed unordered pairs.
pub fn compare(
    candidates: &[Candidate],
    corpus: &[TestCase],
    excluded_fields: &HashSet<String>,
) -> Vec<ComparisonPair> {
    let mut seen: HashSet<(String, (String, String))> = HashSet::new();
    let mut pairs = Vec::new();

    for candidate in candidates {
        let case_a = &corpus[candidate.source];
        let case_b = &corpus[candidate.neighbor];
        let key = (
            candidate.transaction.clone(),
            pair_key(&case_a.id, &case_b.id),
        );
        if !seen.insert(key) {
            continue;
        }

        let distance = f64::from(candidate.distance);
        pairs.push(ComparisonPair {
            transaction: candidate.transaction.clone(),
            case_a: case_a.id.clone(),
            case_b: case_b.id.clone(),
            distance: round4(distance),
            similarity: round4(similarity_score(distance)),
            differences: compare_metadata(case_a, case_b, excluded_fields),
        });
    }

    info!(
        "Comparator emitted {} unique pairs from {} candidates",
        pairs.len(),
        candidates.len()
    );
    pairs
}

pub fn default_excluded_fields() -> HashSet<String> {
    DEFAULT_EXCLUDED_FIELDS
        .iter()
        .map(|f| f.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Candidate;

    fn case(id: &str, tags: &str) -> TestCase {
        let mut c = TestCase::new(id, format!("description {}", id));
        c.transactions = tags.to_string();
        c
    }

    fn candidate(transaction: &str, source: usize, neighbor: usize, distance: f32) -> Candidate {
        Candidate {
            transaction: transaction.to_string(),
            source,
            neighbor,
            distance,
        }
    }

    #[test]
    fn test_unordered_pair_emitted_once() {
        let corpus = vec![case("TC-1", "WT"), case("TC-2", "WT")];
        let candidates = vec![
            candidate("WT", 0, 1, 0.5),
            candidate("WT", 1, 0, 0.5),
        ];
        let pairs = compare(&candidates, &corpus, &default_excluded_fields());
        assert_eq!(pairs.len(), 1);
        // First-encountered direction wins
        assert_eq!(pairs[0].case_a, "TC-1");
        assert_eq!(pairs[0].case_b, "TC-2");
    }

    #[test]
    fn test_same_pair_allowed_in_different_transactions() {
        let corpus = vec![case("TC-1", "WT|BP"), case("TC-2", "WT|BP")];
        let candidates = vec![
            candidate("WT", 0, 1, 0.5),
            candidate("BP", 0, 1, 0.5),
        ];
        let pairs = compare(&candidates, &corpus, &default_excluded_fields());
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_similarity_score_monotone_and_bounded() {
        assert!(similarity_score(0.0) <= 1.0);
        assert!((similarity_score(0.0) - 1.0).abs() < f64::EPSILON);
        let d1 = 0.3;
        let d2 = 0.7;
        assert!(similarity_score(d1) > similarity_score(d2));
        assert!(similarity_score(1_000_000.0) > 0.0);
    }

    #[test]
    fn test_metadata_diff_skips_excluded_and_equal() {
        let mut a = case("TC-1", "WT");
        let mut b = case("TC-2", "WT");
        a.metadata.insert("Profile".into(), serde_json::json!("Retail"));
        b.metadata.insert("Profile".into(), serde_json::json!("Business"));
        a.metadata.insert("Channel".into(), serde_json::json!("Web"));
        b.metadata.insert("Channel".into(), serde_json::json!("Web"));
        a.metadata.insert("Designer".into(), serde_json::json!("X"));
        b.metadata.insert("Designer".into(), serde_json::json!("Y"));

        let diff = compare_metadata(&a, &b, &default_excluded_fields());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff["Profile"], "Retail:Business");
    }

    #[test]
    fn test_metadata_diff_records_one_sided_fields() {
        let mut a = case("TC-1", "WT");
        let b = case("TC-2", "WT");
        a.metadata.insert("Profile".into(), serde_json::json!("Retail"));

        let diff = compare_metadata(&a, &b, &default_excluded_fields());
        assert_eq!(diff["Profile"], "Retail:");
    }

    #[test]
    fn test_distance_and_score_rounded() {
        let corpus = vec![case("TC-1", "WT"), case("TC-2", "WT")];
        let candidates = vec![candidate("WT", 0, 1, 0.333_333_3)];
        let pairs = compare(&candidates, &corpus, &default_excluded_fields());
        assert_eq!(pairs[0].distance, 0.3333);
        assert_eq!(pairs[0].similarity, round4(1.0 / (1.0 + f64::from(0.333_333_3f32))));
    }
}
