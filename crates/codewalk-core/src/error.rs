//! Error types for Codewalk.

use codewalk_types::WalkthroughStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodewalkError {
    #[error("No AI client configured")]
    NoAiClient,

    #[error("No active walkthrough session")]
    NoActiveSession,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: WalkthroughStatus,
        to: WalkthroughStatus,
    },

    #[error("Step generation failed: {0}")]
    Generation(String),

    #[error("AI request failed: {0}")]
    AiRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CodewalkError::InvalidTransition {
            from: WalkthroughStatus::Error,
            to: WalkthroughStatus::Ready,
        };
        assert_eq!(err.to_string(), "Invalid status transition: error -> ready");
        assert_eq!(
            CodewalkError::AiRequest("timeout".to_string()).to_string(),
            "AI request failed: timeout"
        );
    }
}
