//! End-to-end analysis pipeline.
//!
//! Orchestrates one run: vocabulary build, transaction mapping and
//! partitioning, step preprocessing, embedding generation, per-group
//! neighbor search, pairwise comparison, containment refinement, and the
//! final merge into a report. Similarity analysis runs over the matched
//! partition only; the other partitions pass through to the report as-is.
//!
//! Per-item embedding failures degrade that record to a zero vector and are
//! counted, they never abort the run.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::comparator::compare;
use crate::config::AppConfig;
use crate::containment::refine;
use crate::embedding::{combined_text, EmbeddingProvider};
use crate::mapper::{map_dataset, SynonymMap, TransactionVocabulary};
use crate::matcher::find_neighbors;
use crate::merge::merge_results;
use crate::normalizer::LabelNormalizer;
use crate::pool::run_indexed;
use crate::record::TestCase;
use crate::report::Report;
use crate::spelling::SpellingDictionary;

pub struct Pipeline {
    config: AppConfig,
    provider: Arc<dyn EmbeddingProvider>,
    normalizer: LabelNormalizer,
}

impl Pipeline {
    /// Build a pipeline from config and an embedding provider. The provider
    /// must produce vectors of the configured dimension.
    pub fn new(config: AppConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if provider.dimension() != config.embedding.dimension {
            return Err(anyhow!(
                "embedding provider produces {}-dimensional vectors, config expects {}",
                provider.dimension(),
                config.embedding.dimension
            ));
        }

        let dictionary = if config.spelling.dictionary_path.is_empty() {
            SpellingDictionary::empty()
        } else {
            SpellingDictionary::load_from_file(config.spelling.dictionary_path.as_ref())
                .context("loading spelling dictionary")?
                .with_max_edit_distance(config.spelling.max_edit_distance)
        };

        Ok(Self {
            config,
            provider,
            normalizer: LabelNormalizer::new(dictionary),
        })
    }

    pub fn normalizer(&self) -> &LabelNormalizer {
        &self.normalizer
    }

    /// Run the full analysis over a dataset.
    pub async fn analyze(
        &self,
        cases: Vec<TestCase>,
        vocabulary_labels: Vec<String>,
        synonyms: &SynonymMap,
    ) -> Result<Report> {
        let vocabulary = TransactionVocabulary::build(vocabulary_labels, &self.normalizer)
            .context("building transaction vocabulary")?;

        let mut dataset = map_dataset(cases, &vocabulary, synonyms, &self.normalizer);

        self.preprocess_steps(&mut dataset.matched).await;
        let embeddings = self.embed_corpus(&dataset.matched).await;

        let candidates = find_neighbors(
            &dataset.matched,
            &embeddings,
            self.config.embedding.dimension,
            self.config.comparison.max_neighbors,
        )
        .context("searching for neighbor candidates")?;

        let excluded: HashSet<String> =
            self.config.comparison.excluded_fields.iter().cloned().collect();
        let pairs = compare(&candidates, &dataset.matched, &excluded);

        let verdicts = refine(
            &pairs,
            &dataset.matched,
            &self.provider,
            self.config.comparison.jaccard_threshold,
            &self.config.comparison.containment_field,
        );

        let merged = merge_results(&pairs, &verdicts);
        info!(
            "Analysis complete: {} pairs from {} matched records",
            merged.len(),
            dataset.matched.len()
        );
        Ok(Report::from_parts(dataset, merged))
    }

    /// Derive the canonical step block for every record on the worker pool.
    async fn preprocess_steps(&self, cases: &mut [TestCase]) {
        let raw: Arc<Vec<String>> =
            Arc::new(cases.iter().map(|c| c.steps.clone()).collect());
        let task_raw = Arc::clone(&raw);
        let processed = run_indexed(raw.len(), self.config.pool.embed_workers, move |i| {
            Ok::<String, String>(crate::steps::clean_test_steps(&task_raw[i]))
        })
        .await;

        for (case, outcome) in cases.iter_mut().zip(processed) {
            // The task is infallible; the Err arm only covers worker panics.
            match outcome {
                Ok(block) => case.processed_steps = block,
                Err(message) => warn!("Step preprocessing failed for {}: {}", case.id, message),
            }
        }
    }

    /// Embed every record's combined text on the worker pool, index-aligned
    /// with the corpus. Failures degrade to a zero vector.
    async fn embed_corpus(&self, cases: &[TestCase]) -> Vec<Vec<f32>> {
        let dimension = self.config.embedding.dimension;
        let texts: Arc<Vec<String>> = Arc::new(cases.iter().map(combined_text).collect());
        let task_texts = Arc::clone(&texts);
        let provider = Arc::clone(&self.provider);

        let outcomes = run_indexed(texts.len(), self.config.pool.embed_workers, move |i| {
            provider.embed(&task_texts[i]).map_err(|e| e.to_string())
        })
        .await;

        let mut failures = 0usize;
        let embeddings: Vec<Vec<f32>> = outcomes
            .into_iter()
            .zip(cases)
            .map(|(outcome, case)| match outcome {
                Ok(vector) if vector.len() == dimension => vector,
                Ok(vector) => {
                    failures += 1;
                    warn!(
                        "Embedding for {} has dimension {}, expected {}; using zero vector",
                        case.id,
                        vector.len(),
                        dimension
                    );
                    vec![0.0; dimension]
                }
                Err(message) => {
                    failures += 1;
                    warn!("Embedding failed for {}: {}; using zero vector", case.id, message);
                    vec![0.0; dimension]
                }
            })
            .collect();

        if failures > 0 {
            warn!("{} of {} embeddings degraded to zero vectors", failures, embeddings.len());
        }
        embeddings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;

    fn config(dimension: usize) -> AppConfig {
        let mut config = AppConfig::default();
        config.embedding.dimension = dimension;
        config
    }

    fn provider(dimension: usize) -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashEmbedder::new(dimension))
    }

    fn case(id: &str, description: &str, tags: &str) -> TestCase {
        let mut c = TestCase::new(id, description);
        c.transactions = tags.to_string();
        c
    }

    #[test]
    fn test_dimension_mismatch_rejected_at_construction() {
        let result = Pipeline::new(config(384), provider(128));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_vocabulary_aborts() {
        let pipeline = Pipeline::new(config(64), provider(64)).unwrap();
        let result = pipeline
            .analyze(vec![case("TC-1", "d", "WT")], vec![], &SynonymMap::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_partitions_flow_through_to_report() {
        let pipeline = Pipeline::new(config(64), provider(64)).unwrap();
        let cases = vec![
            case("TC-1", "Send a wire", "Wire Transfer"),
            case("TC-2", "Mystery action", "Mystery"),
            case("TC-3", "No tags here", ""),
        ];
        let report = pipeline
            .analyze(cases, vec!["Wire Transfer".to_string()], &SynonymMap::new())
            .await
            .unwrap();

        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.not_matched.len(), 1);
        assert_eq!(report.untagged.len(), 1);
        assert_eq!(report.total_records(), 3);
        // Singleton group: no pairs
        assert!(report.comparisons.is_empty());
    }

    #[tokio::test]
    async fn test_similar_pair_surfaces_with_scores() {
        let pipeline = Pipeline::new(config(64), provider(64)).unwrap();
        let mut a = case("TC-1", "Send a wire transfer to a beneficiary", "Wire Transfer");
        a.steps = "Open screen~Displayed|Enter amount~Accepted".to_string();
        let mut b = case("TC-2", "Send a wire transfer to a beneficiary", "Wire Transfer");
        b.steps = "Open screen~Displayed|Enter amount~Accepted".to_string();

        let report = pipeline
            .analyze(vec![a, b], vec!["Wire Transfer".to_string()], &SynonymMap::new())
            .await
            .unwrap();

        assert_eq!(report.comparisons.len(), 1);
        let pair = &report.comparisons[0];
        assert_eq!(pair.transaction, "Wire Transfer");
        // Identical combined text: distance 0, similarity 1
        assert_eq!(pair.distance, 0.0);
        assert_eq!(pair.similarity, 1.0);
    }

    #[tokio::test]
    async fn test_processed_steps_derived_before_embedding() {
        let pipeline = Pipeline::new(config(64), provider(64)).unwrap();
        let mut a = case("TC-1", "desc", "Wire Transfer");
        a.steps = "Log in~Dashboard shown".to_string();

        let report = pipeline
            .analyze(vec![a], vec!["Wire Transfer".to_string()], &SynonymMap::new())
            .await
            .unwrap();
        assert_eq!(
            report.matched[0].processed_steps,
            "Step 1: Log in | Expected result 1: Dashboard shown"
        );
    }
}
