//! Request/response contract with the external AI capability.

use serde::{Deserialize, Serialize};

use crate::{ConversationTurn, VariableInfo, WalkthroughStep};

/// Bounded bundle of step, code and history handed to the AI capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationContext {
    pub step: WalkthroughStep,
    /// Full source, or a window around the step when over budget.
    pub full_code: String,
    pub language: String,
    pub file_name: String,
    /// Chronological suffix of the session's conversation.
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<VariableInfo>>,
    /// Whether `full_code` was cut down to a window.
    #[serde(default)]
    pub truncated: bool,
    /// Estimated token cost of everything above.
    pub estimated_tokens: usize,
}

/// Answer from the AI capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub text: String,
    pub model_id: String,
    pub tokens_used: u64,
}

/// Cumulative token usage reported by an AI capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Add one request's usage.
    pub fn record(&mut self, input_tokens: u64, output_tokens: u64) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.total_tokens += input_tokens + output_tokens;
    }
}
