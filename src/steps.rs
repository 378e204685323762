//! Test-step preprocessing.
//!
//! Raw step text arrives as a pipe-delimited list where "~" separates the
//! action from its expected result. Preprocessing renders the canonical
//! step-by-step block used as embedding input and for lexical containment:
//!
//! ```text
//! Step 1: <action> | Expected result 1: <expected>
//! Step 2: <action> | No expected result
//! ```

/// Render raw step text into the canonical processed block. Non-steps
/// (blank segments) are dropped; blank input produces an empty string.
pub fn clean_test_steps(raw_steps: &str) -> String {
    let mut lines = Vec::new();
    let mut step_number = 0usize;
    for segment in raw_steps.split('|') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        step_number += 1;
        let (action, expected) = match segment.split_once('~') {
            Some((action, expected)) => (
                action.trim().to_string(),
                format!("Expected result {}: {}", step_number, expected.trim()),
            ),
            None => (segment.to_string(), "No expected result".to_string()),
        };
        lines.push(format!("Step {}: {} | {}", step_number, action, expected));
    }
    lines.join("\n")
}
