//! Term-frequency spelling dictionary.
//!
//! Backs the label normalizer with a bounded edit-distance correction pass.
//! The dictionary is a plain "term count" table (one entry per line); each
//! whitespace token of a phrase is corrected independently to the highest
//! frequency term within the edit distance bound. Unknown tokens pass
//! through unchanged, so an empty dictionary degrades to the identity
//! correction rather than erroring.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::normalizer::levenshtein_distance;

/// Default maximum edit distance accepted for a correction.
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct SpellingDictionary {
    /// term (lowercase) -> frequency
    terms: HashMap<String, u64>,
    /// Terms bucketed by length for candidate pruning.
    by_length: HashMap<usize, Vec<String>>,
    max_edit_distance: usize,
}

impl SpellingDictionary {
    /// An empty dictionary that corrects nothing.
    pub fn empty() -> Self {
        Self {
            terms: HashMap::new(),
            by_length: HashMap::new(),
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
        }
    }

    /// Build a dictionary from in-memory (term, frequency) pairs.
    pub fn from_terms<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut dict = Self::empty();
        for (term, count) in entries {
            dict.insert(term.as_ref(), count);
        }
        dict
    }

    /// Load a "term count" table, one entry per line, whitespace separated.
    /// Lines that do not parse are skipped.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let mut dict = Self::empty();
        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let term = match parts.next() {
                Some(t) => t,
                None => continue,
            };
            let count = parts.next().and_then(|c| c.parse::<u64>().ok());
            if let Some(count) = count {
                dict.insert(term, count);
            }
        }
        info!("Loaded spelling dictionary with {} terms from {}", dict.len(), path.display());
        Ok(dict)
    }

    pub fn with_max_edit_distance(mut self, distance: usize) -> Self {
        self.max_edit_distance = distance;
        self
    }

    fn insert(&mut self, term: &str, count: u64) {
        let term = term.to_lowercase();
        let entry = self.terms.entry(term.clone()).or_insert(0);
        *entry = (*entry).max(count);
        self.by_length
            .entry(term.chars().count())
            .or_default()
            .push(term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Correct a single token. Exact dictionary hits and unknown tokens pass
    /// through; otherwise the highest frequency term within the edit
    /// distance bound wins, ties broken lexicographically for determinism.
    pub fn correct_token(&self, token: &str) -> String {
        if self.terms.is_empty() || token.is_empty() {
            return token.to_string();
        }
        let lower = token.to_lowercase();
        if self.terms.contains_key(&lower) {
            return lower;
        }

        let token_len = lower.chars().count();
        let mut best: Option<(&str, u64, usize)> = None;

        let min_len = token_len.saturating_sub(self.max_edit_distance);
        let max_len = token_len + self.max_edit_distance;
        for len in min_len..=max_len {
            let candidates = match self.by_length.get(&len) {
                Some(c) => c,
                None => continue,
            };
            for candidate in candidates {
                let distance = levenshtein_distance(&lower, candidate);
                if distance > self.max_edit_distance {
                    continue;
                }
                let freq = self.terms[candidate.as_str()];
                let better = match best {
                    None => true,
                    Some((best_term, best_freq, best_dist)) => {
                        (distance, std::cmp::Reverse(freq), candidate.as_str())
                            < (best_dist, std::cmp::Reverse(best_freq), best_term)
                    }
                };
                if better {
                    best = Some((candidate, freq, distance));
                }
            }
        }

        match best {
            Some((term, _, distance)) => {
                debug!("Corrected '{}' to '{}' (distance {})", token, term, distance);
                term.to_string()
            }
            None => token.to_string(),
        }
    }

    /// Correct every whitespace token of a phrase independently.
    pub fn correct_phrase(&self, phrase: &str) -> String {
        if self.terms.is_empty() {
            return phrase.to_string();
        }
        phrase
            .split_whitespace()
            .map(|token| self.correct_token(token))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> SpellingDictionary {
        SpellingDictionary::from_terms([
            ("wire", 500u64),
            ("transfer", 400),
            ("bill", 300),
            ("payment", 300),
            ("transaction", 200),
        ])
    }

    #[test]
    fn test_exact_term_passes_through() {
        assert_eq!(dict().correct_token("wire"), "wire");
        assert_eq!(dict().correct_token("WIRE"), "wire");
    }

    #[test]
    fn test_typo_within_distance_corrected() {
        assert_eq!(dict().correct_token("transfr"), "transfer");
        assert_eq!(dict().correct_token("payement"), "payment");
    }

    #[test]
    fn test_unknown_token_unchanged() {
        assert_eq!(dict().correct_token("zzzzzzzz"), "zzzzzzzz");
    }

    #[test]
    fn test_phrase_correction_is_per_token() {
        assert_eq!(dict().correct_phrase("wire transfr"), "wire transfer");
    }

    #[test]
    fn test_empty_dictionary_is_identity() {
        let d = SpellingDictionary::empty();
        assert_eq!(d.correct_phrase("wire transfr"), "wire transfr");
    }

    #[test]
    fn test_closest_distance_wins_over_frequency() {
        let d = SpellingDictionary::from_terms([("cart", 1000u64), ("card", 10)]);
        // "cardz" is distance 1 from "card" and 2 from "cart"
        assert_eq!(d.correct_token("cardz"), "card");
    }

    #[test]
    fn test_frequency_breaks_equal_distance() {
        let d = SpellingDictionary::from_terms([("cat", 10u64), ("car", 1000)]);
        assert_eq!(d.correct_token("caz"), "car");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wire 500").unwrap();
        writeln!(file, "transfer 400").unwrap();
        writeln!(file, "malformed-line").unwrap();
        let d = SpellingDictionary::load_from_file(file.path()).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.correct_token("transfr"), "transfer");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = SpellingDictionary::load_from_file(Path::new("/nonexistent/dict.txt"));
        assert!(result.is_err());
    }
}
