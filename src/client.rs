// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Inference client for the Ollama chat endpoint
//!
//! `ChatBackend` is the seam between the evaluation loop and the external
//! model server: the real implementation speaks HTTP to `/api/chat`, tests
//! substitute scripted stubs. `VerdictClient` wraps any backend with the
//! bounded retry policy and answer normalization.

use crate::config::RunConfig;
use crate::error::{BackendError, EvalError};
use crate::normalize::{normalize, Verdict};
use crate::prompt::{build_messages, ChatMessage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat completion request sent to the backend
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: DecodingOptions,
}

/// Decoding parameters, in Ollama's option naming
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecodingOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// A synchronous chat-completion capability
pub trait ChatBackend {
    /// Issue one completion call, returning the generated text.
    /// Missing content in an otherwise successful response is empty text.
    fn chat(&self, request: &ChatRequest) -> Result<String, BackendError>;
}

/// HTTP backend against a running Ollama server
pub struct OllamaBackend {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl ChatBackend for OllamaBackend {
    fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: ChatResponse = response.json()?;
        Ok(body.message.map(|m| m.content).unwrap_or_default())
    }
}

/// Retry-wrapping adapter that turns (document, claim) into a verdict
pub struct VerdictClient<B: ChatBackend> {
    backend: B,
    model: String,
    options: DecodingOptions,
    retries: u32,
    retry_sleep: Duration,
}

impl<B: ChatBackend> VerdictClient<B> {
    pub fn new(backend: B, config: &RunConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            options: DecodingOptions {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                num_predict: config.max_new_tokens,
            },
            retries: config.retries,
            retry_sleep: config.retry_sleep,
        }
    }

    /// Ask the model whether `claim` is consistent with `doc`.
    ///
    /// Retries up to the configured budget with a fixed sleep between
    /// attempts; every retry re-issues the identical request. Returns the
    /// normalized verdict plus the raw text for auditing. After the budget
    /// is exhausted the last error is carried in [`EvalError::Inference`].
    pub fn complete(&self, doc: &str, claim: &str) -> Result<(Verdict, String), EvalError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: build_messages(doc, claim),
            stream: false,
            options: self.options,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.backend.chat(&request) {
                Ok(raw) => {
                    let raw = raw.trim().to_string();
                    return Ok((normalize(&raw), raw));
                }
                Err(err) if attempt <= self.retries => {
                    tracing::warn!("inference attempt {} failed: {}; retrying", attempt, err);
                    std::thread::sleep(self.retry_sleep);
                }
                Err(err) => {
                    return Err(EvalError::Inference {
                        attempts: attempt,
                        source: err,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Backend that replays a script of outcomes and counts calls
    struct ScriptedBackend {
        replies: RefCell<VecDeque<Result<String, String>>>,
        calls: Cell<u32>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn chat(&self, _request: &ChatRequest) -> Result<String, BackendError> {
            self.calls.set(self.calls.get() + 1);
            match self.replies.borrow_mut().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(body)) => Err(BackendError::Api { status: 500, body }),
                None => panic!("backend called more times than scripted"),
            }
        }
    }

    fn test_config() -> RunConfig {
        RunConfig {
            retries: 2,
            retry_sleep: Duration::ZERO,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_success_returns_verdict_and_raw_text() {
        let backend = ScriptedBackend::new(vec![Ok("Yes.\n".to_string())]);
        let client = VerdictClient::new(backend, &test_config());

        let (verdict, raw) = client.complete("doc", "claim").unwrap();
        assert_eq!(verdict, Verdict::Yes);
        assert_eq!(raw, "Yes.");
        assert_eq!(client.backend.calls.get(), 1);
    }

    #[test]
    fn test_missing_content_normalizes_to_unknown() {
        let backend = ScriptedBackend::new(vec![Ok(String::new())]);
        let client = VerdictClient::new(backend, &test_config());

        let (verdict, raw) = client.complete("doc", "claim").unwrap();
        assert_eq!(verdict, Verdict::Unknown);
        assert!(raw.is_empty());
    }

    #[test]
    fn test_retries_then_succeeds() {
        let backend = ScriptedBackend::new(vec![
            Err("boom".to_string()),
            Err("boom".to_string()),
            Ok("No".to_string()),
        ]);
        let client = VerdictClient::new(backend, &test_config());

        let (verdict, _) = client.complete("doc", "claim").unwrap();
        assert_eq!(verdict, Verdict::No);
        assert_eq!(client.backend.calls.get(), 3);
    }

    #[test]
    fn test_retry_exhaustion_is_fatal() {
        let backend = ScriptedBackend::new(vec![
            Err("a".to_string()),
            Err("b".to_string()),
            Err("c".to_string()),
        ]);
        let client = VerdictClient::new(backend, &test_config());

        let err = client.complete("doc", "claim").unwrap_err();
        assert_eq!(client.backend.calls.get(), 3);
        match err {
            EvalError::Inference { attempts, source } => {
                assert_eq!(attempts, 3);
                // Last underlying error is preserved
                assert!(source.to_string().contains('c'));
            }
        }
    }
}
