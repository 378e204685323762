//! Transaction mapping
//!
//! Reconciles raw per-record transaction tags against the baselined
//! vocabulary. Resolution order per tag: explicit synonym, verbatim
//! vocabulary hit, normalized fuzzy lookup, raw fallback. The fallback is an
//! explicit "unmatched" outcome, never an error.
//!
//! After mapping, every record lands in exactly one of three partitions:
//! matched (at least one resolved tag in the vocabulary), not-matched (tags
//! present, none in vocabulary), untagged (no tags at all).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::normalizer::{LabelNormalizer, NormalizedKey};
use crate::record::{split_tags, TestCase, TAG_DELIMITER};

/// User-supplied source-label -> target-label overrides, consulted before
/// any normalization. Additively merged: new entries overwrite prior entries
/// for the same source key, nothing is ever removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymMap {
    entries: HashMap<String, String>,
}

impl SynonymMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge<I, K, V>(&mut self, additions: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (source, target) in additions {
            self.entries.insert(source.into(), target.into());
        }
    }

    pub fn get(&self, tag: &str) -> Option<&String> {
        self.entries.get(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Closed, read-only set of baseline-approved transaction labels, indexed
/// once by normalized key for fuzzy lookup.
#[derive(Debug, Clone)]
pub struct TransactionVocabulary {
    labels: HashSet<String>,
    normalized_index: HashMap<NormalizedKey, String>,
}

impl TransactionVocabulary {
    /// Build from the baseline label list. An empty vocabulary is an input
    /// validation error, not an empty-match state.
    pub fn build<I, S>(labels: I, normalizer: &LabelNormalizer) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = HashSet::new();
        let mut normalized_index = HashMap::new();
        for label in labels {
            let label: String = label.into();
            let label = label.trim().to_string();
            if label.is_empty() {
                continue;
            }
            let key = normalizer.normalize(&label);
            if !key.is_empty() {
                normalized_index.entry(key).or_insert_with(|| label.clone());
            }
            set.insert(label);
        }
        if set.is_empty() {
            return Err(PipelineError::InputValidation(
                "Baseline vocabulary is empty".to_string(),
            ));
        }
        info!("Built transaction vocabulary with {} labels", set.len());
        Ok(Self {
            labels: set,
            normalized_index,
        })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn lookup_normalized(&self, key: &NormalizedKey) -> Option<&String> {
        self.normalized_index.get(key)
    }

    pub fn labels(&self) -> impl Iterator<Item = &String> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Resolve one pipe-delimited raw tag string against vocabulary + synonyms.
pub fn map_transactions(
    raw_tag_string: &str,
    vocabulary: &TransactionVocabulary,
    synonyms: &SynonymMap,
    normalizer: &LabelNormalizer,
) -> String {
    let mut resolved = Vec::new();
    for tag in split_tags(raw_tag_string) {
        if let Some(target) = synonyms.get(tag) {
            resolved.push(target.clone());
            continue;
        }
        if vocabulary.contains(tag) {
            resolved.push(tag.to_string());
            continue;
        }
        let key = normalizer.normalize(tag);
        match vocabulary.lookup_normalized(&key) {
            Some(canonical) => {
                debug!("Mapped tag '{}' to vocabulary spelling '{}'", tag, canonical);
                resolved.push(canonical.clone());
            }
            // Explicit unmatched outcome: keep the raw tag.
            None => resolved.push(tag.to_string()),
        }
    }
    resolved.join(&TAG_DELIMITER.to_string())
}

/// Tag -> occurrence count, counting every atomic tag after splitting each
/// resolved tag string on the delimiter. Sorted by count descending, then
/// tag ascending.
pub fn tag_frequencies(cases: &[TestCase]) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for case in cases {
        for tag in case.tags() {
            *counts.entry(tag.to_string()).or_insert(0) += 1;
        }
    }
    let mut frequencies: Vec<(String, u64)> = counts.into_iter().collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    frequencies
}

/// The total, exhaustive three-way partition of a mapped dataset.
#[derive(Debug, Clone, Default)]
pub struct MappedDataset {
    pub matched: Vec<TestCase>,
    pub not_matched: Vec<TestCase>,
    pub untagged: Vec<TestCase>,
    pub matched_frequencies: Vec<(String, u64)>,
    pub not_matched_frequencies: Vec<(String, u64)>,
}

impl MappedDataset {
    pub fn total_records(&self) -> usize {
        self.matched.len() + self.not_matched.len() + self.untagged.len()
    }
}

/// Map every record's tags, derive per-record tag counts, and partition the
/// dataset. Consumes the input so records move into their partition.
pub fn map_dataset(
    mut cases: Vec<TestCase>,
    vocabulary: &TransactionVocabulary,
    synonyms: &SynonymMap,
    normalizer: &LabelNormalizer,
) -> MappedDataset {
    for case in &mut cases {
        case.transactions = map_transactions(&case.transactions, vocabulary, synonyms, normalizer);
    }

    // Dataset-wide counts feed the per-record Transaction_Count derivation.
    let overall = tag_frequencies(&cases);
    let overall_map: HashMap<&str, u64> =
        overall.iter().map(|(tag, count)| (tag.as_str(), *count)).collect();
    for case in &mut cases {
        case.transaction_count = case
            .tags()
            .iter()
            .map(|tag| overall_map.get(tag).copied().unwrap_or(0))
            .sum();
    }

    let mut dataset = MappedDataset::default();
    for case in cases {
        if case.is_untagged() {
            dataset.untagged.push(case);
        } else if case.tags().iter().any(|tag| vocabulary.contains(tag)) {
            dataset.matched.push(case);
        } else {
            dataset.not_matched.push(case);
        }
    }

    dataset.matched_frequencies = tag_frequencies(&dataset.matched);
    dataset.not_matched_frequencies = tag_frequencies(&dataset.not_matched);

    info!(
        "Mapped dataset: {} matched, {} not matched, {} untagged",
        dataset.matched.len(),
        dataset.not_matched.len(),
        dataset.untagged.len()
    );
    dataset
}
