// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Benchmark harness for the FlashCheck fact-consistency classifier
//!
//! This crate provides:
//! - Free-text answer normalization into yes/no/unknown verdicts
//! - Prompt construction for the FlashCheck chat interface
//! - An Ollama inference client with bounded retry
//! - Reproducible sampling from the AggreFact benchmark (local parquet,
//!   streaming, or full download)
//! - A sequential evaluation loop with per-class curated examples
//! - CSV/JSONL result artifacts and a console summary

pub mod client;
pub mod config;
pub mod datasets;
pub mod error;
pub mod hub;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod report;

pub use client::{ChatBackend, ChatRequest, OllamaBackend, VerdictClient};
pub use config::RunConfig;
pub use datasets::{load_sample, DatasetSource, LabeledRecord, Sample};
pub use error::{BackendError, EvalError};
pub use normalize::{normalize, Verdict};
pub use pipeline::{CuratedExample, CuratedSet, EvaluationResult, EvaluationRun, RunReport};
