//! Feedback classification through the external oracle.
//!
//! Reviewers leave free-text feedback on comparison pairs; the oracle is an
//! opaque text classifier asked to reduce that feedback to BOOST (the pair
//! really is similar) or PENALIZE (major functional differences). Anything
//! the oracle returns that does not parse to one of the two tokens is
//! UNKNOWN, as is any per-item oracle failure. Batches run on a small
//! bounded worker pool with a join barrier.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::pool::run_indexed;

/// Worker width for oracle round-trips.
pub const FEEDBACK_POOL_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedbackClass {
    Boost,
    Penalize,
    Unknown,
}

impl FeedbackClass {
    /// Parse an oracle response. The contract is strict: the trimmed,
    /// upper-cased response must be exactly one of the two tokens.
    pub fn parse(response: &str) -> Self {
        match response.trim().to_uppercase().as_str() {
            "BOOST" => FeedbackClass::Boost,
            "PENALIZE" => FeedbackClass::Penalize,
            _ => FeedbackClass::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackClass::Boost => "BOOST",
            FeedbackClass::Penalize => "PENALIZE",
            FeedbackClass::Unknown => "UNKNOWN",
        }
    }
}

/// Context handed to the oracle for one pair's feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub transaction: String,
    pub case_a: String,
    pub case_b: String,
    pub feedback: String,
}

impl FeedbackRequest {
    /// The prompt the oracle receives.
    pub fn prompt(&self) -> String {
        format!(
            "You are an AI assistant evaluating user feedback on test case similarity.\n\
             The user has provided feedback for the following test cases:\n\
             - Transaction type: {}\n\
             - Test Case 1: {}\n\
             - Test Case 2: {}\n\
             User Feedback: \"{}\"\n\
             Based on the feedback, classify it into one of two categories:\n\
             1. BOOST - If the feedback indicates that the test cases are similar \
             with minor wording changes or format differences.\n\
             2. PENALIZE - If the feedback indicates major differences in \
             functionality, steps, or transaction type.\n\
             Respond with ONLY \"BOOST\" or \"PENALIZE\" and nothing else.",
            self.transaction, self.case_a, self.case_b, self.feedback
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub transaction: String,
    pub case_a: String,
    pub case_b: String,
    pub feedback: String,
    pub classification: FeedbackClass,
    /// Oracle failure message when the result degraded to UNKNOWN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Opaque text-classification oracle. One request/response method; the
/// response is parsed by the caller.
pub trait FeedbackOracle: Send + Sync {
    fn classify(&self, prompt: &str) -> Result<String>;
}

/// Classify a batch of feedback entries over the bounded pool. Per-item
/// oracle failures degrade that item to UNKNOWN with the error recorded.
pub async fn classify_batch(
    oracle: Arc<dyn FeedbackOracle>,
    requests: Vec<FeedbackRequest>,
    width: usize,
) -> Vec<FeedbackResult> {
    let shared: Arc<Vec<FeedbackRequest>> = Arc::new(requests);
    let task_requests = Arc::clone(&shared);
    let outcomes = run_indexed(shared.len(), width, move |index| {
        let request = &task_requests[index];
        oracle
            .classify(&request.prompt())
            .map_err(|e| e.to_string())
    })
    .await;

    let results: Vec<FeedbackResult> = shared
        .iter()
        .zip(outcomes)
        .map(|(request, outcome)| match outcome {
            Ok(response) => FeedbackResult {
                transaction: request.transaction.clone(),
                case_a: request.case_a.clone(),
                case_b: request.case_b.clone(),
                feedback: request.feedback.clone(),
                classification: FeedbackClass::parse(&response),
                error: None,
            },
            Err(message) => {
                warn!(
                    "Oracle failed for pair ({}, {}): {}",
                    request.case_a, request.case_b, message
                );
                FeedbackResult {
                    transaction: request.transaction.clone(),
                    case_a: request.case_a.clone(),
                    case_b: request.case_b.clone(),
                    feedback: request.feedback.clone(),
                    classification: FeedbackClass::Unknown,
                    error: Some(message),
                }
            }
        })
        .collect();

    info!("Classified {} feedback entries", results.len());
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct ScriptedOracle;

    impl FeedbackOracle for ScriptedOracle {
        fn classify(&self, prompt: &str) -> Result<String> {
            if prompt.contains("identical") {
                Ok("boost\n".to_string())
            } else if prompt.contains("different flow") {
                Ok("PENALIZE".to_string())
            } else if prompt.contains("flaky") {
                Err(anyhow!("oracle timed out"))
            } else {
                Ok("I think they are mostly the same".to_string())
            }
        }
    }

    fn request(feedback: &str) -> FeedbackRequest {
        FeedbackRequest {
            transaction: "Wire Transfer".to_string(),
            case_a: "TC-1".to_string(),
            case_b: "TC-2".to_string(),
            feedback: feedback.to_string(),
        }
    }

    #[test]
    fn test_parse_strict_tokens() {
        assert_eq!(FeedbackClass::parse("BOOST"), FeedbackClass::Boost);
        assert_eq!(FeedbackClass::parse("  penalize "), FeedbackClass::Penalize);
        assert_eq!(FeedbackClass::parse("BOOST!"), FeedbackClass::Unknown);
        assert_eq!(FeedbackClass::parse(""), FeedbackClass::Unknown);
    }

    #[test]
    fn test_prompt_carries_context() {
        let prompt = request("steps look identical").prompt();
        assert!(prompt.contains("Wire Transfer"));
        assert!(prompt.contains("TC-1"));
        assert!(prompt.contains("TC-2"));
        assert!(prompt.contains("steps look identical"));
    }

    #[tokio::test]
    async fn test_batch_classification_and_degradation() {
        let oracle: Arc<dyn FeedbackOracle> = Arc::new(ScriptedOracle);
        let requests = vec![
            request("these are identical"),
            request("completely different flow"),
            request("flaky"),
            request("hmm"),
        ];
        let results = classify_batch(oracle, requests, FEEDBACK_POOL_WIDTH).await;

        assert_eq!(results[0].classification, FeedbackClass::Boost);
        assert_eq!(results[1].classification, FeedbackClass::Penalize);
        assert_eq!(results[2].classification, FeedbackClass::Unknown);
        assert!(results[2].error.as_ref().unwrap().contains("timed out"));
        // Unparseable prose is the explicit fallback, not an error
        assert_eq!(results[3].classification, FeedbackClass::Unknown);
        assert!(results[3].error.is_none());
    }
}
