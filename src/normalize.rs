// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Free-text answer normalization for fact-consistency verdicts
//!
//! Maps arbitrary model output to a yes/no/unknown verdict. Two tiers:
//! a whole-word scan for an explicit "yes"/"no" anywhere in the text
//! (handles verbose answers like "Answer: No"), then a first-token lookup
//! through alternative label vocabularies (handles terse classifier-style
//! outputs like "LABEL_1" or "entailment").

use serde::{Deserialize, Serialize};
use std::fmt;

/// Consistency verdict for a (document, claim) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Claim is consistent with the document
    Yes,
    /// Claim is inconsistent with the document
    No,
    /// Model output could not be resolved to yes or no
    Unknown,
}

impl Verdict {
    /// Derive the expected verdict from a ground-truth label
    /// (1 = consistent, 0 = inconsistent). Never returns `Unknown`.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Verdict::Yes
        } else {
            Verdict::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "yes",
            Verdict::No => "no",
            Verdict::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn-marker and special tokens some checkpoints leak into the output
const CONTROL_TOKENS: &[&str] = &["<end_of_turn>", "<eos>", "<bos>", "<pad>"];

/// Normalize raw model output into a [`Verdict`].
///
/// Priority order, first match wins:
/// 1. strip control tokens; empty text is `Unknown`
/// 2. whole-word "yes" anywhere, then whole-word "no" anywhere
/// 3. first token, stripped of punctuation/quotes, through the label table
/// 4. otherwise `Unknown`
///
/// Always returns a value; ambiguity is `Unknown`, never an error.
pub fn normalize(raw: &str) -> Verdict {
    let mut cleaned = raw.to_string();
    for token in CONTROL_TOKENS {
        cleaned = cleaned.replace(token, " ");
    }
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Verdict::Unknown;
    }

    // Whole-word scan takes priority over position: "Answer: No" must
    // resolve to No even though "no" is not the first word. Token equality
    // keeps substrings like "not" from matching.
    let lower = cleaned.to_lowercase();
    if lower.split_whitespace().any(|t| t == "yes") {
        return Verdict::Yes;
    }
    if lower.split_whitespace().any(|t| t == "no") {
        return Verdict::No;
    }

    // Fallback: first token through the label table
    let first = cleaned.split_whitespace().next().unwrap_or("");
    let first = first.trim_matches(|c| c == '.' || c == ',' || c == '"' || c == '\'');
    let token: String = first
        .chars()
        .filter(|c| c.is_alphabetic() || *c == '_')
        .collect::<String>()
        .to_lowercase();

    match token.as_str() {
        "yes" | "label_1" | "entailment" | "supported" | "supports" => Verdict::Yes,
        "no" | "label_0" | "contradiction" | "refuted" | "unsupported" => Verdict::No,
        _ => Verdict::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_from_label() {
        assert_eq!(Verdict::from_label(1), Verdict::Yes);
        assert_eq!(Verdict::from_label(0), Verdict::No);
    }

    #[test]
    fn test_plain_answers() {
        assert_eq!(normalize("Yes"), Verdict::Yes);
        assert_eq!(normalize("No"), Verdict::No);
        assert_eq!(normalize("yes."), Verdict::Yes);
        assert_eq!(normalize("\"No\","), Verdict::No);
    }

    #[test]
    fn test_embedded_answer_wins_over_position() {
        assert_eq!(normalize("Answer: No"), Verdict::No);
        assert_eq!(normalize("The answer is yes, definitely"), Verdict::Yes);
    }

    #[test]
    fn test_yes_scan_takes_priority_over_no() {
        assert_eq!(normalize("no wait, yes"), Verdict::Yes);
    }

    #[test]
    fn test_substring_does_not_match() {
        // "not" and "nothing" must not trigger the `no` branch
        assert_eq!(normalize("not sure"), Verdict::Unknown);
        assert_eq!(normalize("nothing supports this"), Verdict::Unknown);
    }

    #[test]
    fn test_control_tokens_stripped() {
        assert_eq!(normalize("<end_of_turn> Yes."), Verdict::Yes);
        assert_eq!(normalize("No<eos>"), Verdict::No);
        assert_eq!(normalize("<bos><pad>"), Verdict::Unknown);
    }

    #[test]
    fn test_label_vocabulary_fallback() {
        assert_eq!(normalize("LABEL_1"), Verdict::Yes);
        assert_eq!(normalize("LABEL_0"), Verdict::No);
        assert_eq!(normalize("entailment"), Verdict::Yes);
        assert_eq!(normalize("Supported."), Verdict::Yes);
        assert_eq!(normalize("contradiction"), Verdict::No);
        assert_eq!(normalize("refuted"), Verdict::No);
        assert_eq!(normalize("unsupported"), Verdict::No);
    }

    #[test]
    fn test_unknown_cases() {
        assert_eq!(normalize(""), Verdict::Unknown);
        assert_eq!(normalize("   "), Verdict::Unknown);
        assert_eq!(normalize("maybe"), Verdict::Unknown);
        assert_eq!(normalize("42"), Verdict::Unknown);
    }
}
