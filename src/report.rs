//! Report assembly and export.
//!
//! The run produces six independently addressable sections: the three
//! record partitions, the two tag-frequency summaries, and the merged
//! comparison table. Each section exports to CSV (for review in a
//! spreadsheet) and JSON (for downstream tooling); `export_all` writes
//! every section into a timestamped run directory.

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::mapper::MappedDataset;
use crate::record::{MergedPair, TestCase};

/// One addressable slice of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Matched,
    NotMatched,
    Untagged,
    MatchedFrequencies,
    NotMatchedFrequencies,
    Comparisons,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Matched,
        Section::NotMatched,
        Section::Untagged,
        Section::MatchedFrequencies,
        Section::NotMatchedFrequencies,
        Section::Comparisons,
    ];

    /// File-name stem for exports.
    pub fn stem(&self) -> &'static str {
        match self {
            Section::Matched => "matched_cases",
            Section::NotMatched => "not_matched_cases",
            Section::Untagged => "untagged_cases",
            Section::MatchedFrequencies => "matched_frequencies",
            Section::NotMatchedFrequencies => "not_matched_frequencies",
            Section::Comparisons => "comparison_pairs",
        }
    }
}

/// Complete output of one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub matched: Vec<TestCase>,
    pub not_matched: Vec<TestCase>,
    pub untagged: Vec<TestCase>,
    pub matched_frequencies: Vec<(String, u64)>,
    pub not_matched_frequencies: Vec<(String, u64)>,
    pub comparisons: Vec<MergedPair>,
}

impl Report {
    pub fn from_parts(dataset: MappedDataset, comparisons: Vec<MergedPair>) -> Self {
        Self {
            matched: dataset.matched,
            not_matched: dataset.not_matched,
            untagged: dataset.untagged,
            matched_frequencies: dataset.matched_frequencies,
            not_matched_frequencies: dataset.not_matched_frequencies,
            comparisons,
        }
    }

    pub fn total_records(&self) -> usize {
        self.matched.len() + self.not_matched.len() + self.untagged.len()
    }

    /// Write one section as CSV.
    pub fn write_csv(&self, section: Section, path: &Path) -> Result<()> {
        match section {
            Section::Matched => write_cases_csv(&self.matched, path)?,
            Section::NotMatched => write_cases_csv(&self.not_matched, path)?,
            Section::Untagged => write_cases_csv(&self.untagged, path)?,
            Section::MatchedFrequencies => {
                write_frequencies_csv(&self.matched_frequencies, path)?
            }
            Section::NotMatchedFrequencies => {
                write_frequencies_csv(&self.not_matched_frequencies, path)?
            }
            Section::Comparisons => write_comparisons_csv(&self.comparisons, path)?,
        }
        info!("Wrote {} to {}", section.stem(), path.display());
        Ok(())
    }

    /// Write one section as pretty-printed JSON.
    pub fn write_json(&self, section: Section, path: &Path) -> Result<()> {
        let json = match section {
            Section::Matched => serde_json::to_string_pretty(&self.matched)?,
            Section::NotMatched => serde_json::to_string_pretty(&self.not_matched)?,
            Section::Untagged => serde_json::to_string_pretty(&self.untagged)?,
            Section::MatchedFrequencies => {
                serde_json::to_string_pretty(&frequency_rows(&self.matched_frequencies))?
            }
            Section::NotMatchedFrequencies => {
                serde_json::to_string_pretty(&frequency_rows(&self.not_matched_frequencies))?
            }
            Section::Comparisons => serde_json::to_string_pretty(&self.comparisons)?,
        };
        fs::write(path, json)?;
        info!("Wrote {} to {}", section.stem(), path.display());
        Ok(())
    }

    /// Export every section in both formats into a timestamped subdirectory
    /// of `output_dir`. Returns the run directory.
    pub fn export_all(&self, output_dir: &Path) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let run_dir = output_dir.join(format!("run_{}", timestamp));
        fs::create_dir_all(&run_dir)?;

        for section in Section::ALL {
            self.write_csv(section, &run_dir.join(format!("{}.csv", section.stem())))?;
            self.write_json(section, &run_dir.join(format!("{}.json", section.stem())))?;
        }
        info!("Exported report to {}", run_dir.display());
        Ok(run_dir)
    }

    /// One-screen run summary for the terminal.
    pub fn print_summary(&self) {
        println!("=== Analysis summary ===");
        println!("Total records:        {}", self.total_records());
        println!("  Matched:            {}", self.matched.len());
        println!("  Not matched:        {}", self.not_matched.len());
        println!("  Untagged:           {}", self.untagged.len());
        println!("Comparison pairs:     {}", self.comparisons.len());
        let contained = self.comparisons.iter().filter(|p| p.contained).count();
        println!("  Contained pairs:    {}", contained);
        if let Some((tag, count)) = self.matched_frequencies.first() {
            println!("Most frequent tag:    {} ({})", tag, count);
        }
    }
}

#[derive(Serialize)]
struct FrequencyRow<'a> {
    transaction: &'a str,
    count: u64,
}

fn frequency_rows(frequencies: &[(String, u64)]) -> Vec<FrequencyRow<'_>> {
    frequencies
        .iter()
        .map(|(transaction, count)| FrequencyRow {
            transaction,
            count: *count,
        })
        .collect()
}

/// Test-case sections carry the typed core plus the union of metadata
/// columns seen in the section, so every row has the same shape.
fn write_cases_csv(cases: &[TestCase], path: &Path) -> Result<()> {
    let metadata_columns: BTreeSet<&str> = cases
        .iter()
        .flat_map(|c| c.metadata.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec![
        "test_case_id",
        "Description",
        "Transactions",
        "Transaction_Count",
        "test_steps",
        "Processed_Steps",
    ];
    header.extend(metadata_columns.iter().copied());
    writer.write_record(&header)?;

    for case in cases {
        let mut row = vec![
            case.id.clone(),
            case.description.clone(),
            case.transactions.clone(),
            case.transaction_count.to_string(),
            case.steps.clone(),
            case.processed_steps.clone(),
        ];
        for column in &metadata_columns {
            row.push(case.metadata_str(column));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_frequencies_csv(frequencies: &[(String, u64)], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Transaction", "Count"])?;
    for (transaction, count) in frequencies {
        writer.write_record([transaction.clone(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_comparisons_csv(pairs: &[MergedPair], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "Transaction",
        "Test Case 1",
        "Test Case 2",
        "Distance",
        "Similarity Score",
        "Differences",
        "Contained",
        "Jaccard",
        "Containment Distance",
        "Feedback",
    ])?;
    for pair in pairs {
        let differences = pair
            .differences
            .iter()
            .map(|(field, value)| format!("{}: {}", field, value))
            .collect::<Vec<String>>()
            .join("; ");
        writer.write_record([
            pair.transaction.clone(),
            pair.case_a.clone(),
            pair.case_b.clone(),
            pair.distance.to_string(),
            pair.similarity.to_string(),
            differences,
            pair.contained.to_string(),
            pair.jaccard.to_string(),
            pair.containment_distance.to_string(),
            pair.feedback.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
