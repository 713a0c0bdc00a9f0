//! Boundary to the external AI capability.

use crate::Result;
use codewalk_types::{ExplanationContext, ExplanationResponse, TokenUsage};

/// Something that can explain code and answer questions about it.
///
/// Transport failures surface as [`CodewalkError::AiRequest`](crate::CodewalkError::AiRequest);
/// the core never retries or applies deadlines itself.
#[async_trait::async_trait]
pub trait AiClient: Send + Sync {
    async fn generate_explanation(&self, context: &ExplanationContext) -> Result<ExplanationResponse>;

    async fn answer_question(&self, question: &str, context: &ExplanationContext) -> Result<ExplanationResponse>;

    /// Whether the capability looks usable right now.
    async fn health_check(&self) -> bool;

    /// Cumulative usage since construction.
    fn token_usage(&self) -> TokenUsage;
}
