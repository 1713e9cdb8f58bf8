// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Evaluation loop: sample in, scored results and curated examples out
//!
//! Processes records strictly one at a time in provider order. A record
//! whose retry budget is exhausted aborts the whole run; there is no
//! per-record skip, so the declared sample-size accounting stays honest.

use crate::client::{ChatBackend, VerdictClient};
use crate::config::RunConfig;
use crate::datasets::Sample;
use crate::normalize::Verdict;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Outcome for one benchmark record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub dataset: Option<String>,
    pub expected: Verdict,
    pub predicted: Verdict,
    pub correct: bool,
    pub raw_output: String,
    pub doc: String,
    pub claim: String,
}

/// A correctly-predicted triple retained for demonstration use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratedExample {
    pub document: String,
    pub claim: String,
    pub expected: Verdict,
}

/// Per-class bounded collections of curated examples.
///
/// Insertion order is processing order; once a class reaches the cap
/// further examples of that class are dropped (first-come, not best-score).
#[derive(Debug, Clone)]
pub struct CuratedSet {
    cap: usize,
    by_class: BTreeMap<Verdict, Vec<CuratedExample>>,
}

impl CuratedSet {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            by_class: BTreeMap::new(),
        }
    }

    /// Add an example under its expected class; no-op once the class is full
    pub fn insert(&mut self, example: CuratedExample) {
        let class = self.by_class.entry(example.expected).or_default();
        if class.len() < self.cap {
            class.push(example);
        }
    }

    pub fn class(&self, expected: Verdict) -> &[CuratedExample] {
        self.by_class
            .get(&expected)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Prediction breakdown over a finished run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerdictCounts {
    /// Expected yes, predicted yes
    pub true_yes: usize,
    /// Expected no, predicted no
    pub true_no: usize,
    /// Expected no, predicted yes
    pub false_yes: usize,
    /// Expected yes, predicted no
    pub false_no: usize,
    /// Prediction could not be resolved to yes or no
    pub unknown: usize,
}

impl VerdictCounts {
    pub fn total(&self) -> usize {
        self.true_yes + self.true_no + self.false_yes + self.false_no + self.unknown
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunReport {
    pub results: Vec<EvaluationResult>,
    pub curated: CuratedSet,
}

impl RunReport {
    /// Mean of `correct` over all processed records
    pub fn accuracy(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let correct = self.results.iter().filter(|r| r.correct).count();
        correct as f64 / self.results.len() as f64
    }

    /// Accuracy per dataset tag, sorted by accuracy descending.
    /// Empty when no record carries a tag.
    pub fn accuracy_by_dataset(&self) -> Vec<(String, f64)> {
        let mut grouped: HashMap<&str, (usize, usize)> = HashMap::new();
        for result in &self.results {
            if let Some(tag) = result.dataset.as_deref() {
                let entry = grouped.entry(tag).or_default();
                entry.0 += result.correct as usize;
                entry.1 += 1;
            }
        }

        let mut accuracies: Vec<(String, f64)> = grouped
            .into_iter()
            .map(|(tag, (correct, total))| (tag.to_string(), correct as f64 / total as f64))
            .collect();
        // Tie-break on the tag so the ordering is stable across runs
        accuracies.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        accuracies
    }

    pub fn counts(&self) -> VerdictCounts {
        let mut counts = VerdictCounts::default();
        for result in &self.results {
            match (result.expected, result.predicted) {
                (Verdict::Yes, Verdict::Yes) => counts.true_yes += 1,
                (Verdict::No, Verdict::No) => counts.true_no += 1,
                (Verdict::No, Verdict::Yes) => counts.false_yes += 1,
                (Verdict::Yes, Verdict::No) => counts.false_no += 1,
                _ => counts.unknown += 1,
            }
        }
        counts
    }
}

/// Sequential evaluation run over one sample
pub struct EvaluationRun<B: ChatBackend> {
    client: VerdictClient<B>,
    curated_per_class: usize,
}

impl<B: ChatBackend> EvaluationRun<B> {
    pub fn new(backend: B, config: &RunConfig) -> Self {
        Self {
            client: VerdictClient::new(backend, config),
            curated_per_class: config.curated_per_class,
        }
    }

    /// Evaluate every record in the sample.
    ///
    /// Fatal on inference failure after retry exhaustion: the run aborts
    /// rather than silently skipping records. Streaming samples may yield
    /// fewer records than declared; that is not an error.
    pub fn run(&self, sample: Sample) -> Result<RunReport> {
        let pb = ProgressBar::new(sample.declared as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut results = Vec::with_capacity(sample.declared);
        let mut curated = CuratedSet::new(self.curated_per_class);

        for record in sample.records {
            let record = record?;
            let expected = Verdict::from_label(record.label);
            let (predicted, raw_output) = self.client.complete(&record.doc, &record.claim)?;
            let correct = predicted == expected;

            if correct {
                curated.insert(CuratedExample {
                    document: record.doc.clone(),
                    claim: record.claim.clone(),
                    expected,
                });
            }

            results.push(EvaluationResult {
                dataset: record.dataset,
                expected,
                predicted,
                correct,
                raw_output,
                doc: record.doc,
                claim: record.claim,
            });
            pb.inc(1);
        }

        pb.finish_and_clear();

        if results.len() < sample.declared {
            tracing::warn!(
                "Source under-delivered: {} of {} declared records",
                results.len(),
                sample.declared
            );
        }

        Ok(RunReport { results, curated })
    }
}
