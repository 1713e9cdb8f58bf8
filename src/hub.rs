// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Remote catalog access via the Hugging Face datasets-server rows API
//!
//! The rows endpoint serves any hosted dataset split as paged JSON, which
//! covers both remote modes: full-download walks every page up front,
//! streaming pulls pages lazily as the shuffle buffer drains.

use crate::datasets::LabeledRecord;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;

const DATASETS_SERVER_URL: &str = "https://datasets-server.huggingface.co";

/// Maximum page size the rows endpoint allows
const PAGE_LENGTH: usize = 100;

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: LabeledRecord,
}

/// Client for one dataset split on the datasets-server
pub struct HubClient {
    http: reqwest::blocking::Client,
    base_url: String,
    dataset: String,
    split: String,
}

impl HubClient {
    pub fn new(dataset: impl Into<String>, split: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: DATASETS_SERVER_URL.to_string(),
            dataset: dataset.into(),
            split: split.into(),
        })
    }

    /// Point at a different server (tests, mirrors)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn fetch_page(&self, offset: usize, length: usize) -> Result<RowsPage> {
        let response = self
            .http
            .get(format!("{}/rows", self.base_url))
            .query(&[
                ("dataset", self.dataset.as_str()),
                ("config", "default"),
                ("split", self.split.as_str()),
                ("offset", &offset.to_string()),
                ("length", &length.to_string()),
            ])
            .send()
            .with_context(|| format!("Failed to fetch rows for {}", self.dataset))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Rows request for {} failed with status {}: {}",
                self.dataset,
                status,
                response.text().unwrap_or_default()
            );
        }

        response
            .json::<RowsPage>()
            .with_context(|| format!("Malformed rows response for {}", self.dataset))
    }

    /// Download the entire split
    pub fn fetch_all(&self) -> Result<Vec<LabeledRecord>> {
        tracing::info!("Downloading full split '{}' of {}", self.split, self.dataset);

        let first = self.fetch_page(0, PAGE_LENGTH)?;
        let total = first.num_rows_total;

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Fetching rows: [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut records: Vec<LabeledRecord> =
            first.rows.into_iter().map(|entry| entry.row).collect();
        pb.set_position(records.len() as u64);

        while records.len() < total {
            let page = self.fetch_page(records.len(), PAGE_LENGTH)?;
            if page.rows.is_empty() {
                // Server disagrees with its declared total; stop rather than spin
                tracing::warn!(
                    "Split exhausted at {} rows (server declared {})",
                    records.len(),
                    total
                );
                break;
            }
            records.extend(page.rows.into_iter().map(|entry| entry.row));
            pb.set_position(records.len() as u64);
        }

        pb.finish_with_message("Downloaded");
        Ok(records)
    }

    /// Lazily iterate the split page by page without materializing it
    pub fn stream(self) -> RecordStream {
        RecordStream {
            client: self,
            pending: VecDeque::new(),
            offset: 0,
            exhausted: false,
        }
    }
}

/// Lazy page-by-page record iterator over one split
pub struct RecordStream {
    client: HubClient,
    pending: VecDeque<LabeledRecord>,
    offset: usize,
    exhausted: bool,
}

impl Iterator for RecordStream {
    type Item = Result<LabeledRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.pop_front() {
            return Some(Ok(record));
        }
        if self.exhausted {
            return None;
        }

        match self.client.fetch_page(self.offset, PAGE_LENGTH) {
            Ok(page) => {
                if page.rows.is_empty() || self.offset + page.rows.len() >= page.num_rows_total {
                    self.exhausted = true;
                }
                self.offset += page.rows.len();
                self.pending = page.rows.into_iter().map(|entry| entry.row).collect();
                self.pending.pop_front().map(Ok)
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_page_deserialization() {
        let body = r#"{
            "features": [{"name": "doc", "type": {"dtype": "string"}}],
            "rows": [
                {"row_idx": 0, "row": {"dataset": "AggreFact-CNN", "doc": "d", "claim": "c", "label": 1}},
                {"row_idx": 1, "row": {"doc": "d2", "claim": "c2", "label": 0}}
            ],
            "num_rows_total": 2
        }"#;

        let page: RowsPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.num_rows_total, 2);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].row.dataset.as_deref(), Some("AggreFact-CNN"));
        assert_eq!(page.rows[1].row.label, 0);
        assert!(page.rows[1].row.dataset.is_none());
    }
}
