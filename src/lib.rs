//! casetriage reconciles free-text test-case records against a controlled
//! vocabulary of business transaction labels and surfaces near-duplicate
//! test cases within each transaction group.
//!
//! The pipeline runs in stages: noisy transaction tags are normalized and
//! mapped onto the baseline vocabulary (synonym table first, then verbatim,
//! then fuzzy), the dataset is partitioned into matched / not-matched /
//! untagged, and the matched partition is embedded and searched per
//! transaction group for nearest neighbors. Candidate pairs are scored,
//! their metadata diffed, refined with a lexical containment check, and
//! merged into a reviewable report. Reviewer feedback on pairs can be
//! classified through an external oracle.

pub mod cli;
pub mod comparator;
pub mod config;
pub mod containment;
pub mod embedding;
pub mod error;
pub mod feedback;
pub mod index;
pub mod input;
pub mod mapper;
pub mod matcher;
pub mod merge;
pub mod normalizer;
pub mod pipeline;
pub mod pool;
pub mod record;
pub mod registry;
pub mod report;
pub mod session;
pub mod spelling;
pub mod steps;

pub use config::AppConfig;
pub use embedding::{EmbeddingProvider, HashEmbedder};
pub use error::{PipelineError, Result};
pub use feedback::{FeedbackClass, FeedbackOracle, FeedbackRequest, FeedbackResult};
pub use mapper::{MappedDataset, SynonymMap, TransactionVocabulary};
pub use normalizer::LabelNormalizer;
pub use pipeline::Pipeline;
pub use record::{ComparisonPair, ContainmentVerdict, MergedPair, TestCase};
pub use registry::CanonicalLabelRegistry;
pub use report::{Report, Section};
pub use session::CanonicalSession;
pub use spelling::SpellingDictionary;
