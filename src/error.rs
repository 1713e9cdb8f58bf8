// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Error taxonomy for the evaluation run
//!
//! Normalization ambiguity is not an error (it is `Verdict::Unknown` and
//! scores as a mismatch); only inference failure after retry exhaustion is
//! fatal here. Dataset source failures surface as `anyhow` errors with
//! context at load time, before any records are processed.

use thiserror::Error;

/// A single failed call against the inference backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Fatal evaluation errors
#[derive(Debug, Error)]
pub enum EvalError {
    /// The inference backend failed on every attempt of the retry budget.
    /// Carries the last underlying error for diagnostics.
    #[error("inference failed after {attempts} attempts: {source}")]
    Inference {
        attempts: u32,
        #[source]
        source: BackendError,
    },
}
