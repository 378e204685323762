//! Tabular input ingestion.
//!
//! The raw test-case source is a CSV requiring at minimum an identifier
//! column, a description column, and a pipe-delimited transaction-tag
//! column; the baseline vocabulary source is a CSV exposing one column of
//! canonical transaction names. Missing required columns are hard input
//! validation errors naming the missing element. Every column outside the
//! typed core lands in the record's open metadata map.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::record::TestCase;

/// Required columns of the test-case source.
pub const ID_COLUMN: &str = "test_case_id";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const TRANSACTIONS_COLUMN: &str = "Transactions";
/// Optional raw-step column.
pub const STEPS_COLUMN: &str = "test_steps";

/// Required column of the vocabulary source.
pub const VOCABULARY_COLUMN: &str = "Transaction";

fn column_position(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Load test cases from a CSV file. Columns outside the typed core are kept
/// as string metadata.
pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let id_idx = column_position(&headers, ID_COLUMN)
        .ok_or_else(|| PipelineError::missing_column("Test case file", ID_COLUMN))?;
    let desc_idx = column_position(&headers, DESCRIPTION_COLUMN)
        .ok_or_else(|| PipelineError::missing_column("Test case file", DESCRIPTION_COLUMN))?;
    let tags_idx = column_position(&headers, TRANSACTIONS_COLUMN)
        .ok_or_else(|| PipelineError::missing_column("Test case file", TRANSACTIONS_COLUMN))?;
    let steps_idx = column_position(&headers, STEPS_COLUMN);

    let core_columns = [Some(id_idx), Some(desc_idx), Some(tags_idx), steps_idx];
    let mut cases = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();

        let id = field(id_idx);
        if id.is_empty() {
            continue;
        }
        let mut case = TestCase::new(id, field(desc_idx));
        case.transactions = field(tags_idx);
        if let Some(idx) = steps_idx {
            case.steps = field(idx);
        }

        for (idx, header) in headers.iter().enumerate() {
            if core_columns.contains(&Some(idx)) {
                continue;
            }
            let value = row.get(idx).unwrap_or("").trim();
            if !value.is_empty() {
                case.metadata
                    .insert(header.to_string(), serde_json::Value::String(value.to_string()));
            }
        }
        cases.push(case);
    }

    info!("Loaded {} test cases from {}", cases.len(), path.display());
    Ok(cases)
}

/// Load the baseline vocabulary labels. Emptiness is rejected when the
/// vocabulary is built, but a missing column fails here.
pub fn load_vocabulary_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = column_position(&headers, VOCABULARY_COLUMN)
        .ok_or_else(|| PipelineError::missing_column("Vocabulary file", VOCABULARY_COLUMN))?;

    let mut labels = Vec::new();
    for row in reader.records() {
        let row = row?;
        let label = row.get(column).unwrap_or("").trim();
        if !label.is_empty() {
            labels.push(label.to_string());
        }
    }
    info!("Loaded {} vocabulary labels from {}", labels.len(), path.display());
    Ok(labels)
}

/// Load a user synonym table from a JSON object of source -> target labels.
pub fn load_synonyms(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let synonyms: HashMap<String, String> = serde_json::from_str(&content)?;
    info!("Loaded {} synonyms from {}", synonyms.len(), path.display());
    Ok(synonyms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_test_cases_with_metadata() {
        let file = write_file(
            "test_case_id,Description,Transactions,test_steps,Profile,Channel\n\
             TC-1,Pay a bill,Bill Payment,Open~ok|Pay~done,Retail,Web\n\
             TC-2,Send a wire,Wire Transfer,,,\n",
        );
        let cases = load_test_cases(file.path()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, "TC-1");
        assert_eq!(cases[0].transactions, "Bill Payment");
        assert_eq!(cases[0].steps, "Open~ok|Pay~done");
        assert_eq!(cases[0].metadata_str("Profile"), "Retail");
        assert_eq!(cases[0].metadata_str("Channel"), "Web");
        // Blank metadata cells stay absent
        assert!(cases[1].metadata.is_empty());
    }

    #[test]
    fn test_missing_required_column_names_it() {
        let file = write_file("test_case_id,Description\nTC-1,desc\n");
        let err = load_test_cases(file.path()).unwrap_err();
        assert!(err.to_string().contains("Transactions"));
    }

    #[test]
    fn test_rows_without_id_skipped() {
        let file = write_file(
            "test_case_id,Description,Transactions\n,orphan,\nTC-1,desc,WT\n",
        );
        let cases = load_test_cases(file.path()).unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn test_load_vocabulary_labels() {
        let file = write_file("Transaction\nWire Transfer\n\nBill Payment\n");
        let labels = load_vocabulary_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["Wire Transfer", "Bill Payment"]);
    }

    #[test]
    fn test_vocabulary_missing_column() {
        let file = write_file("Name\nWire Transfer\n");
        let err = load_vocabulary_labels(file.path()).unwrap_err();
        assert!(err.to_string().contains("Transaction"));
    }

    #[test]
    fn test_load_synonyms() {
        let file = write_file(r#"{"BP": "Bill Payment", "WT": "Wire Transfer"}"#);
        let synonyms = load_synonyms(file.path()).unwrap();
        assert_eq!(synonyms["BP"], "Bill Payment");
        assert_eq!(synonyms.len(), 2);
    }

    #[test]
    fn test_missing_file_is_validation_error() {
        let err = load_test_cases(Path::new("/nonexistent/cases.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }
}
