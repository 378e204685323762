//! Canonical label registry
//!
//! Incrementally learned mapping from normalized label text to the canonical
//! display label first seen for that key. Bindings are append-only within a
//! processing run: once a key is bound, later labels that normalize to the
//! same key, or within fuzzy distance of it, resolve to the existing
//! canonical string instead of creating a new entry.
//!
//! Known sharp edge: resolution is first-match-wins in insertion order, so
//! the arrival order of labels decides which surface form becomes canonical,
//! and an unlucky order can merge unrelated labels that happen to sit within
//! the similarity threshold before a distinguishing label arrives. This
//! mirrors the upstream review workflow and is preserved deliberately.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::normalizer::{similarity_ratio, LabelNormalizer, NormalizedKey};

/// Default similarity-ratio acceptance threshold for fuzzy key resolution.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBinding {
    pub key: NormalizedKey,
    pub canonical: String,
}

/// Insertion-ordered registry of key -> canonical label bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalLabelRegistry {
    bindings: Vec<CanonicalBinding>,
    threshold: f64,
}

impl Default for CanonicalLabelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalLabelRegistry {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[CanonicalBinding] {
        &self.bindings
    }

    /// Resolve a raw label to its canonical display string, binding it as a
    /// new canonical label if nothing in the registry clears the threshold.
    ///
    /// Blank labels (empty normalized key) are never bound and resolve to
    /// themselves.
    pub fn resolve(&mut self, raw_label: &str, normalizer: &LabelNormalizer) -> String {
        let key = normalizer.normalize(raw_label);
        if key.is_empty() {
            return raw_label.to_string();
        }

        if self.bindings.is_empty() {
            self.bind(key, raw_label);
            return raw_label.to_string();
        }

        let mut best: Option<(usize, f64)> = None;
        for (idx, binding) in self.bindings.iter().enumerate() {
            let sim = similarity_ratio(key.as_str(), binding.key.as_str());
            if sim < self.threshold {
                continue;
            }
            // Strictly greater keeps the earliest binding on ties.
            let better = match best {
                None => true,
                Some((_, best_sim)) => sim > best_sim,
            };
            if better {
                best = Some((idx, sim));
            }
        }

        match best {
            Some((idx, sim)) => {
                let canonical = self.bindings[idx].canonical.clone();
                debug!(
                    "Resolved '{}' to canonical '{}' (similarity {:.3})",
                    raw_label, canonical, sim
                );
                canonical
            }
            None => {
                self.bind(key, raw_label);
                raw_label.to_string()
            }
        }
    }

    fn bind(&mut self, key: NormalizedKey, canonical: &str) {
        debug!("Bound new canonical label '{}' (key '{}')", canonical, key);
        self.bindings.push(CanonicalBinding {
            key,
            canonical: canonical.to_string(),
        });
    }
}

/// Extract "Key: value" field labels from free text, merging key variants
/// through a registry instance scoped to the extraction pass (so "Role:" and
/// "role :" collapse to one field name). Values for a repeated canonical key
/// accumulate in encounter order.
pub fn extract_field_labels(
    text: &str,
    registry: &mut CanonicalLabelRegistry,
    normalizer: &LabelNormalizer,
) -> BTreeMap<String, Vec<String>> {
    let mut labels: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            let canonical = registry.resolve(key, normalizer);
            labels.entry(canonical).or_default().push(value.to_string());
        }
    }
    labels
}
