// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Benchmark CLI for the FlashCheck fact-consistency classifier
//!
//! Usage:
//!   flashcheck-eval --sample-size 200 --seed 42
//!   DATA_PARQUET=/path/to/test.parquet flashcheck-eval
//!   STREAMING=1 flashcheck-eval

use anyhow::Result;
use clap::Parser;
use flashcheck_eval::config::{env_flag, RunConfig};
use flashcheck_eval::datasets::{load_sample, DatasetSource};
use flashcheck_eval::pipeline::EvaluationRun;
use flashcheck_eval::report::{print_summary, write_csv, write_jsonl};
use flashcheck_eval::{OllamaBackend, Verdict};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flashcheck-eval")]
#[command(about = "Evaluate FlashCheck against the AggreFact benchmark")]
#[command(version)]
struct Args {
    /// Ollama model identifier
    #[arg(
        short,
        long,
        env = "OLLAMA_MODEL",
        default_value = "hf.co/nehmeailabs-org/nehme-flashcheck-270m:Q8_0"
    )]
    model: String,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Number of records to evaluate
    #[arg(short = 'n', long, default_value_t = 200)]
    sample_size: usize,

    /// Shuffle seed for reproducibility
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Local parquet snapshot; selects local mode and skips remote fetches
    #[arg(long, env = "DATA_PARQUET")]
    parquet: Option<PathBuf>,

    /// Stream the remote split instead of downloading it fully
    #[arg(long)]
    streaming: bool,

    /// Hugging Face dataset repository
    #[arg(long, default_value = "lytang/LLM-AggreFact")]
    dataset: String,

    /// Dataset split to evaluate
    #[arg(long, default_value = "test")]
    split: String,

    /// Maximum tokens to generate per answer
    #[arg(long, default_value_t = 8)]
    max_new_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Top-k sampling cutoff
    #[arg(long, default_value_t = 1)]
    top_k: u32,

    /// Top-p sampling cutoff
    #[arg(long, default_value_t = 1.0)]
    top_p: f32,

    /// Retries after a failed inference call
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Seconds to sleep between retry attempts
    #[arg(long, default_value_t = 1.0)]
    retry_sleep: f64,

    /// Curated examples to keep per expected class
    #[arg(long, default_value_t = 40)]
    curated_per_class: usize,

    /// Output directory for result artifacts
    #[arg(short, long, default_value = "results")]
    output: PathBuf,
}

impl Args {
    fn resolve_source(&self) -> DatasetSource {
        // Empty DATA_PARQUET counts as unset, matching shell-style usage
        let parquet = self
            .parquet
            .clone()
            .filter(|p| !p.as_os_str().is_empty());

        if let Some(path) = parquet {
            DatasetSource::LocalParquet(path)
        } else if self.streaming || env_flag("STREAMING") {
            DatasetSource::Streaming
        } else {
            DatasetSource::FullDownload
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = RunConfig {
        model: args.model.clone(),
        ollama_url: args.ollama_url.clone(),
        sample_size: args.sample_size,
        seed: args.seed,
        max_new_tokens: args.max_new_tokens,
        temperature: args.temperature,
        top_k: args.top_k,
        top_p: args.top_p,
        retries: args.retries,
        retry_sleep: Duration::from_secs_f64(args.retry_sleep),
        curated_per_class: args.curated_per_class,
        dataset_name: args.dataset.clone(),
        split: args.split.clone(),
        source: args.resolve_source(),
    };

    tracing::info!("FlashCheck Evaluation");
    tracing::info!("=====================");
    tracing::info!("Model: {}", config.model);
    tracing::info!("Seed: {}", config.seed);
    tracing::info!("Source: {:?}", config.source);

    let sample = load_sample(&config)?;
    println!(
        "Running {} samples using Ollama model: {}",
        sample.declared, config.model
    );

    let backend = OllamaBackend::new(&config.ollama_url)?;
    let run = EvaluationRun::new(backend, &config);
    let report = run.run(sample)?;

    std::fs::create_dir_all(&args.output)?;

    let csv_path = args
        .output
        .join(format!("aggrefact_flashcheck_{}.csv", config.sample_size));
    write_csv(&csv_path, &report.results)?;
    println!("\nSaved full results: {}", csv_path.display());

    print_summary(&report);

    let yes_path = args.output.join("perfect_examples_yes.jsonl");
    let no_path = args.output.join("perfect_examples_no.jsonl");
    let yes_examples = report.curated.class(Verdict::Yes);
    let no_examples = report.curated.class(Verdict::No);
    write_jsonl(&yes_path, yes_examples)?;
    write_jsonl(&no_path, no_examples)?;

    println!(
        "\nSaved perfect YES examples: {} ({})",
        yes_path.display(),
        yes_examples.len()
    );
    println!(
        "Saved perfect NO examples:  {} ({})",
        no_path.display(),
        no_examples.len()
    );

    Ok(())
}
