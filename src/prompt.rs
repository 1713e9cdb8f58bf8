// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 NehmeAILabs

//! Prompt construction for the FlashCheck chat interface

use serde::{Deserialize, Serialize};

/// System instruction the FlashCheck checkpoints were trained against.
/// Process-wide constant; the model expects this exact task framing.
pub const SYSTEM_PROMPT: &str = "You are a fact checking model developed by NehmeAILabs. \
    Determine whether the provided claim is consistent with the corresponding document. \
    Consistency in this context implies that all information presented in the claim is \
    substantiated by the document. If not, it should be considered inconsistent. \
    Please assess the claim's consistency with the document by responding with either \
    \"Yes\" or \"No\".";

/// A role-tagged chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the two-message request for one (document, claim) pair.
/// The user message layout is the format FlashCheck requires.
pub fn build_messages(doc: &str, claim: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Document: {doc}\n\nClaim: {claim}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_order_and_roles() {
        let messages = build_messages("the sky is blue", "the sky has a color");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_user_message_layout() {
        let messages = build_messages("doc text", "claim text");
        assert_eq!(messages[1].content, "Document: doc text\n\nClaim: claim text");
    }
}
