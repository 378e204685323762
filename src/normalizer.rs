//! Label normalization
//!
//! Standardizes noisy, human-written transaction labels so that variants
//! like "Wire-Transfers", "wire  transfer" and "Wire Transfr" all produce
//! the same matching key:
//! - Spelling correction against the term-frequency dictionary
//! - Case folding and hyphen handling
//! - Punctuation stripping and whitespace collapsing
//! - Trailing-"s" singularization (naive by design; this is not a
//!   morphological analyzer and "address" becomes "addres")
//!
//! Also provides the similarity-ratio metric used for fuzzy lookups.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::spelling::SpellingDictionary;

/// The cleaned, case-folded, singularized form of a label. Used purely for
/// matching, never displayed. Blank or non-textual input normalizes to the
/// empty key; callers must treat empty-key lookups as "no label".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label normalizer backed by a spelling dictionary.
#[derive(Debug, Clone, Default)]
pub struct LabelNormalizer {
    dictionary: SpellingDictionary,
}

impl LabelNormalizer {
    pub fn new(dictionary: SpellingDictionary) -> Self {
        Self { dictionary }
    }

    /// Normalizer without spelling correction.
    pub fn without_dictionary() -> Self {
        Self {
            dictionary: SpellingDictionary::empty(),
        }
    }

    /// Normalize a raw label into its matching key. Steps run in order:
    /// spell-correct, lowercase, hyphens to spaces, strip punctuation,
    /// collapse whitespace, drop a trailing "s".
    pub fn normalize(&self, raw: &str) -> NormalizedKey {
        if raw.trim().is_empty() {
            return NormalizedKey(String::new());
        }

        let corrected = self.dictionary.correct_phrase(raw);
        let mut label = corrected.to_lowercase();
        label = label.replace('-', " ");
        label = label
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
            .collect();
        label = label.split_whitespace().collect::<Vec<&str>>().join(" ");

        if label.ends_with('s') {
            label.pop();
        }

        trace!("Normalized '{}' to '{}'", raw, label);
        NormalizedKey(label)
    }
}

/// Similarity between two strings as normalized Levenshtein distance,
/// 0.0 (completely different) to 1.0 (identical).
pub fn similarity_ratio(s1: &str, s2: &str) -> f64 {
    if s1 == s2 {
        return 1.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let distance = levenshtein_distance(s1, s2);
    let max_len = s1.chars().count().max(s2.chars().count());
    1.0 - (distance as f64 / max_len as f64)
}

/// Levenshtein edit distance over characters.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len1][len2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spelling::SpellingDictionary;

    fn normalizer() -> LabelNormalizer {
        LabelNormalizer::without_dictionary()
    }

    #[test]
    fn test_lowercase_and_trim() {
        let n = normalizer();
        assert_eq!(n.normalize("  Wire Transfer  ").as_str(), "wire transfer");
        assert_eq!(n.normalize("BILL PAYMENT").as_str(), "bill payment");
    }

    #[test]
    fn test_hyphens_become_spaces() {
        let n = normalizer();
        assert_eq!(n.normalize("wire-transfer").as_str(), "wire transfer");
    }

    #[test]
    fn test_punctuation_stripped() {
        let n = normalizer();
        assert_eq!(n.normalize("Bill Payment!").as_str(), "bill payment");
        assert_eq!(n.normalize("Role: Admin").as_str(), "role admin");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let n = normalizer();
        assert_eq!(n.normalize("wire    transfer").as_str(), "wire transfer");
    }

    #[test]
    fn test_trailing_s_dropped() {
        let n = normalizer();
        assert_eq!(n.normalize("Wire Transfers").as_str(), "wire transfer");
        // Naive singularization, documented limitation
        assert_eq!(n.normalize("address").as_str(), "addres");
    }

    #[test]
    fn test_blank_input_yields_empty_key() {
        let n = normalizer();
        assert!(n.normalize("").is_empty());
        assert!(n.normalize("   ").is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let n = normalizer();
        for raw in ["Wire-Transfers", "BILL  Payment!", "deposits", ""] {
            let once = n.normalize(raw);
            let twice = n.normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for '{}'", raw);
        }
    }

    #[test]
    fn test_spell_correction_runs_first() {
        let dict = SpellingDictionary::from_terms([("wire", 100u64), ("transfer", 100)]);
        let n = LabelNormalizer::new(dict);
        assert_eq!(n.normalize("Wire Transfr").as_str(), "wire transfer");
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert!((similarity_ratio("wire", "wire") - 1.0).abs() < f64::EPSILON);
        assert!(similarity_ratio("wire", "") < f64::EPSILON);
        let sim = similarity_ratio("wire transfer", "wire transfers");
        assert!(sim > 0.9 && sim < 1.0);
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein_distance("test", "test"), 0);
        assert_eq!(levenshtein_distance("", "test"), 4);
        assert_eq!(levenshtein_distance("cat", "cats"), 1);
        assert_eq!(levenshtein_distance("cat", "car"), 1);
    }
}
