// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Run configuration, resolved once at startup
//!
//! Every knob that affects reproducibility lives here and is frozen before
//! the first record is read. Nothing reads ambient environment state after
//! resolution.

use crate::datasets::DatasetSource;
use std::time::Duration;

/// Configuration for a single evaluation run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Ollama model identifier
    pub model: String,
    /// Base URL of the Ollama server
    pub ollama_url: String,
    /// Number of records to evaluate
    pub sample_size: usize,
    /// Shuffle seed
    pub seed: u64,
    /// Decoding: maximum tokens to generate
    pub max_new_tokens: u32,
    /// Decoding: sampling temperature
    pub temperature: f32,
    /// Decoding: top-k
    pub top_k: u32,
    /// Decoding: top-p
    pub top_p: f32,
    /// Retries after a failed inference call (total attempts = retries + 1)
    pub retries: u32,
    /// Sleep between retry attempts
    pub retry_sleep: Duration,
    /// Cap on curated examples kept per expected class
    pub curated_per_class: usize,
    /// Hugging Face dataset repository
    pub dataset_name: String,
    /// Dataset split to evaluate
    pub split: String,
    /// Where records come from
    pub source: DatasetSource,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "hf.co/nehmeailabs-org/nehme-flashcheck-270m:Q8_0".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            sample_size: 200,
            seed: 42,
            max_new_tokens: 8,
            temperature: 0.0,
            top_k: 1,
            top_p: 1.0,
            retries: 2,
            retry_sleep: Duration::from_secs(1),
            curated_per_class: 40,
            dataset_name: "lytang/LLM-AggreFact".to_string(),
            split: "test".to_string(),
            source: DatasetSource::FullDownload,
        }
    }
}

/// Interpret a boolean-like environment value ("1", "true", "yes", "on")
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_benchmark_constants() {
        let config = RunConfig::default();
        assert_eq!(config.sample_size, 200);
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_new_tokens, 8);
        assert_eq!(config.retries, 2);
        assert_eq!(config.curated_per_class, 40);
        assert_eq!(config.dataset_name, "lytang/LLM-AggreFact");
        assert_eq!(config.split, "test");
    }

    #[test]
    fn test_env_flag_truthiness() {
        std::env::set_var("FLASHCHECK_TEST_FLAG_ON", "On");
        std::env::set_var("FLASHCHECK_TEST_FLAG_OFF", "0");
        assert!(env_flag("FLASHCHECK_TEST_FLAG_ON"));
        assert!(!env_flag("FLASHCHECK_TEST_FLAG_OFF"));
        assert!(!env_flag("FLASHCHECK_TEST_FLAG_UNSET"));
        std::env::remove_var("FLASHCHECK_TEST_FLAG_ON");
        std::env::remove_var("FLASHCHECK_TEST_FLAG_OFF");
    }
}
