//! Core record types.
//!
//! `TestCase` keeps a typed core (identifier, description, steps, resolved
//! transactions) and an open extension map for whatever metadata columns the
//! source carried. The extension map is what gets diffed between candidate
//! pairs; the typed core is covered by the exclusion list instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pipe delimiter separating atomic transaction tags within one record.
pub const TAG_DELIMITER: char = '|';

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique within a dataset.
    pub id: String,
    pub description: String,
    /// Raw step text, pipe-delimited, with "~" carving action from expected
    /// result. May be empty.
    #[serde(default)]
    pub steps: String,
    /// Pipe-delimited transaction tags; empty means untagged. Raw on ingest,
    /// replaced with resolved tags by the mapper.
    #[serde(default)]
    pub transactions: String,
    /// Canonical step-by-step text derived from `steps`.
    #[serde(default)]
    pub processed_steps: String,
    /// Sum of dataset-wide occurrence counts of this record's tags.
    #[serde(default)]
    pub transaction_count: u64,
    /// Arbitrary metadata columns; sparse, fields may be absent.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            steps: String::new(),
            transactions: String::new(),
            processed_steps: String::new(),
            transaction_count: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Atomic tags of this record, trimmed, empty entries dropped.
    pub fn tags(&self) -> Vec<&str> {
        split_tags(&self.transactions)
    }

    pub fn is_untagged(&self) -> bool {
        self.tags().is_empty()
    }

    /// Metadata value stringified for diffing; absent fields stringify to "".
    pub fn metadata_str(&self, field: &str) -> String {
        match self.metadata.get(field) {
            None => String::new(),
            Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Split a pipe-delimited tag string into trimmed atomic tags.
pub fn split_tags(tag_string: &str) -> Vec<&str> {
    tag_string
        .split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Unordered pair identity: the sorted identifier tuple.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// A candidate pair of similar test cases within one transaction group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonPair {
    pub transaction: String,
    pub case_a: String,
    pub case_b: String,
    /// Euclidean distance between the description embeddings, rounded.
    pub distance: f64,
    /// 1 / (1 + distance), rounded; always in (0, 1].
    pub similarity: f64,
    /// field -> "valueA:valueB" for every non-excluded field that differs.
    pub differences: BTreeMap<String, String>,
}

/// Lexical containment judgment for a pair flagged by the profile gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainmentVerdict {
    pub case_a: String,
    pub case_b: String,
    pub contained: bool,
    /// Word-set Jaccard similarity of the two step texts, rounded.
    pub jaccard: f64,
    /// Embedding distance between the step texts; audit only, not a gate.
    pub distance: f64,
}

/// One reviewable row: a comparison pair joined with its containment
/// verdict. Verdict fields default to displayable values when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedPair {
    pub transaction: String,
    pub case_a: String,
    pub case_b: String,
    pub distance: f64,
    pub similarity: f64,
    pub differences: BTreeMap<String, String>,
    pub contained: bool,
    pub jaccard: f64,
    pub containment_distance: f64,
    /// Human feedback slot, initially empty.
    pub feedback: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_split_and_trim() {
        let mut case = TestCase::new("TC-1", "desc");
        case.transactions = "Wire Transfer | Bill Payment||".to_string();
        assert_eq!(case.tags(), vec!["Wire Transfer", "Bill Payment"]);
    }

    #[test]
    fn test_untagged_when_blank() {
        let mut case = TestCase::new("TC-1", "desc");
        assert!(case.is_untagged());
        case.transactions = " | ".to_string();
        assert!(case.is_untagged());
    }

    #[test]
    fn test_pair_key_is_order_insensitive() {
        assert_eq!(pair_key("TC-2", "TC-1"), pair_key("TC-1", "TC-2"));
    }

    #[test]
    fn test_metadata_str_absent_is_empty() {
        let mut case = TestCase::new("TC-1", "desc");
        assert_eq!(case.metadata_str("Profile"), "");
        case.metadata
            .insert("Profile".to_string(), serde_json::json!("Retail"));
        assert_eq!(case.metadata_str("Profile"), "Retail");
        case.metadata.insert("Count".to_string(), serde_json::json!(3));
        assert_eq!(case.metadata_str("Count"), "3");
    }
}
