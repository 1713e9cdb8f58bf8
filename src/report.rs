// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Output artifacts: results table, curated JSONL files, console summary

use crate::pipeline::{CuratedExample, EvaluationResult, RunReport};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the full result collection as a CSV table, one row per record
pub fn write_csv(path: &Path, results: &[EvaluationResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create results file: {}", path.display()))?;

    writer.write_record([
        "dataset",
        "expected",
        "prediction",
        "correct",
        "raw_output",
        "doc",
        "claim",
    ])?;

    for result in results {
        writer.write_record([
            result.dataset.as_deref().unwrap_or(""),
            result.expected.as_str(),
            result.predicted.as_str(),
            if result.correct { "true" } else { "false" },
            result.raw_output.as_str(),
            result.doc.as_str(),
            result.claim.as_str(),
        ])?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write results file: {}", path.display()))?;
    Ok(())
}

/// Write one curated-example collection as line-delimited JSON
pub fn write_jsonl(path: &Path, examples: &[CuratedExample]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create examples file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for example in examples {
        serde_json::to_writer(&mut writer, example)?;
        writer.write_all(b"\n")?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write examples file: {}", path.display()))?;
    Ok(())
}

/// Print the run summary: overall accuracy, prediction breakdown, and
/// per-dataset accuracy (descending) when tags are present
pub fn print_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(30));
    println!("OVERALL PERFORMANCE (sample)");
    println!("{}", "=".repeat(30));
    println!("Accuracy: {:.2}%", report.accuracy() * 100.0);

    let counts = report.counts();
    println!(
        "Predictions: {} correct yes, {} correct no, {} wrong yes, {} wrong no, {} unresolved",
        counts.true_yes, counts.true_no, counts.false_yes, counts.false_no, counts.unknown
    );

    let by_dataset = report.accuracy_by_dataset();
    if !by_dataset.is_empty() {
        println!("\n{}", "=".repeat(30));
        println!("PERFORMANCE BY DATASET (sample)");
        println!("{}", "=".repeat(30));
        for (tag, accuracy) in &by_dataset {
            println!("{:<30} {:>7.2}%", tag, accuracy * 100.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Verdict;

    fn sample_result(tag: &str, correct: bool) -> EvaluationResult {
        EvaluationResult {
            dataset: Some(tag.to_string()),
            expected: Verdict::Yes,
            predicted: if correct { Verdict::Yes } else { Verdict::No },
            correct,
            raw_output: "Yes, the claim is \"supported\"".to_string(),
            doc: "a document,\nwith a newline".to_string(),
            claim: "a claim".to_string(),
        }
    }

    #[test]
    fn test_csv_roundtrip_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_csv(&path, &[sample_result("tag_a", true), sample_result("tag_b", false)]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[2], "prediction");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "tag_a");
        assert_eq!(&rows[0][3], "true");
        // Embedded quotes and newlines survive CSV quoting
        assert_eq!(&rows[0][5], "a document,\nwith a newline");
        assert_eq!(&rows[1][2], "no");
    }

    #[test]
    fn test_jsonl_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.jsonl");

        let examples = vec![
            CuratedExample {
                document: "d1".to_string(),
                claim: "c1".to_string(),
                expected: Verdict::Yes,
            },
            CuratedExample {
                document: "d2".to_string(),
                claim: "c2".to_string(),
                expected: Verdict::No,
            },
        ];
        write_jsonl(&path, &examples).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["document"], "d1");
        assert_eq!(first["expected"], "yes");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["expected"], "no");
    }
}
