// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Sample acquisition for the AggreFact benchmark
//!
//! Three mutually exclusive source modes:
//! - local parquet file: load everything, seeded shuffle, take the sample
//! - streaming: lazy page reads through a bounded shuffle buffer
//! - full download (default): fetch the whole split, seeded shuffle, take
//!
//! Local and full-download orderings are bit-reproducible for a fixed seed
//! and source snapshot. The streaming shuffle is approximate: quality is
//! bounded by the buffer capacity, matching shuffle-buffer semantics of
//! streamed dataset readers.

use crate::config::RunConfig;
use crate::hub::HubClient;
use anyhow::{Context, Result};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Shuffle buffer capacity for streaming mode
const STREAM_SHUFFLE_BUFFER: usize = 10_000;

/// One labeled benchmark record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    /// Reference document
    pub doc: String,
    /// Claim to check against the document
    pub claim: String,
    /// Ground truth: 1 = consistent, 0 = inconsistent
    pub label: i64,
    /// Sub-source tag within the benchmark, if present
    #[serde(default)]
    pub dataset: Option<String>,
}

/// Where benchmark records come from
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Local parquet snapshot of the split
    LocalParquet(PathBuf),
    /// Lazy remote reads, approximate shuffle
    Streaming,
    /// Fetch the whole remote split up front
    FullDownload,
}

/// A bounded, reproducibly-ordered sequence of records plus the count the
/// provider commits to. Streaming mode may deliver fewer than declared;
/// callers must tolerate under-delivery.
pub struct Sample {
    pub records: Box<dyn Iterator<Item = Result<LabeledRecord>>>,
    pub declared: usize,
}

impl Sample {
    /// Wrap an already-materialized record list
    pub fn from_records(records: Vec<LabeledRecord>) -> Self {
        let declared = records.len();
        Self {
            records: Box::new(records.into_iter().map(Ok)),
            declared,
        }
    }
}

/// Deterministic Fisher-Yates shuffle, then take the first `sample_size`
/// records (or fewer if the source is smaller)
fn shuffled_take(
    mut records: Vec<LabeledRecord>,
    seed: u64,
    sample_size: usize,
) -> Vec<LabeledRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    records.shuffle(&mut rng);
    records.truncate(sample_size);
    records
}

/// Approximate streaming shuffle: keep up to `capacity` records buffered
/// and emit a seeded-random pick as each new record arrives
pub struct ShuffleBuffer<I> {
    inner: I,
    buffer: Vec<LabeledRecord>,
    capacity: usize,
    rng: ChaCha8Rng,
}

impl<I> ShuffleBuffer<I>
where
    I: Iterator<Item = Result<LabeledRecord>>,
{
    pub fn new(inner: I, capacity: usize, seed: u64) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(capacity),
            capacity,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<I> Iterator for ShuffleBuffer<I>
where
    I: Iterator<Item = Result<LabeledRecord>>,
{
    type Item = Result<LabeledRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.inner.next() {
                Some(Ok(record)) => self.buffer.push(record),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if self.buffer.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.buffer.len());
        Some(Ok(self.buffer.swap_remove(idx)))
    }
}

/// Load the evaluation sample according to the configured source mode.
///
/// Declared count is `min(sample_size, available)` for the materialized
/// modes and exactly `sample_size` for streaming. Fails before any records
/// are yielded if the source cannot be opened.
pub fn load_sample(config: &RunConfig) -> Result<Sample> {
    match &config.source {
        DatasetSource::LocalParquet(path) => {
            tracing::info!("Loading from local parquet: {}", path.display());
            let records = load_parquet(path)?;
            Ok(Sample::from_records(shuffled_take(
                records,
                config.seed,
                config.sample_size,
            )))
        }
        DatasetSource::Streaming => {
            tracing::info!("Streaming from {} ({})", config.dataset_name, config.split);
            let stream = HubClient::new(&config.dataset_name, &config.split)?.stream();
            let shuffled = ShuffleBuffer::new(stream, STREAM_SHUFFLE_BUFFER, config.seed);
            Ok(Sample {
                records: Box::new(shuffled.take(config.sample_size)),
                declared: config.sample_size,
            })
        }
        DatasetSource::FullDownload => {
            tracing::info!("Loading dataset: {} ({})", config.dataset_name, config.split);
            let records = HubClient::new(&config.dataset_name, &config.split)?.fetch_all()?;
            Ok(Sample::from_records(shuffled_take(
                records,
                config.seed,
                config.sample_size,
            )))
        }
    }
}

/// Read all records from a local parquet snapshot
fn load_parquet(path: &Path) -> Result<Vec<LabeledRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, row) in reader.get_row_iter(None)?.enumerate() {
        let row =
            row.with_context(|| format!("Failed to read row {} in {}", idx, path.display()))?;
        let record = record_from_row(&row)
            .with_context(|| format!("Malformed row {} in {}", idx, path.display()))?;
        records.push(record);
    }

    Ok(records)
}

fn record_from_row(row: &Row) -> Result<LabeledRecord> {
    let mut doc = None;
    let mut claim = None;
    let mut label = None;
    let mut dataset = None;

    for (name, field) in row.get_column_iter() {
        match (name.as_str(), field) {
            ("doc", Field::Str(value)) => doc = Some(value.clone()),
            ("claim", Field::Str(value)) => claim = Some(value.clone()),
            ("label", Field::Int(value)) => label = Some(*value as i64),
            ("label", Field::Long(value)) => label = Some(*value),
            ("dataset", Field::Str(value)) => dataset = Some(value.clone()),
            _ => {}
        }
    }

    Ok(LabeledRecord {
        doc: doc.context("row missing 'doc' column")?,
        claim: claim.context("row missing 'claim' column")?,
        label: label.context("row missing 'label' column")?,
        dataset,
    })
}
