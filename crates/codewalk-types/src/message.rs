//! Message protocol between the walkthrough core and its UI.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ConversationTurn, WalkthroughState};

/// Messages pushed from the core to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Full snapshot of the session.
    StateUpdate { state: Box<WalkthroughState> },
    /// A step's explanation became available.
    StepExplanation { step_id: String, explanation: String },
    /// Conversation log changed.
    ConversationUpdate { history: Vec<ConversationTurn> },
    /// User-visible error.
    Error { message: String },
    /// Loading indicator toggled.
    Loading {
        is_loading: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Session ended.
    Ended { session_id: Uuid },
}

/// Messages sent from the UI to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// UI finished loading and wants the current state.
    Ready,
    GoToStep { index: i64 },
    NextStep,
    PreviousStep,
    AskQuestion { question: String },
    StopWalkthrough,
    /// Reveal a line range in the editor. Not a state change.
    GoToCode { start_line: u32, end_line: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_tagged_format() {
        let msg: InboundMessage = serde_json::from_str(r#"{"type":"go_to_step","index":2}"#).unwrap();
        assert_eq!(msg, InboundMessage::GoToStep { index: 2 });

        let msg: InboundMessage = serde_json::from_str(r#"{"type":"next_step"}"#).unwrap();
        assert_eq!(msg, InboundMessage::NextStep);

        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"go_to_code","start_line":3,"end_line":5}"#).unwrap();
        assert_eq!(msg, InboundMessage::GoToCode { start_line: 3, end_line: 5 });
    }

    #[test]
    fn test_loading_message_omits_empty_text() {
        let json = serde_json::to_string(&OutboundMessage::Loading {
            is_loading: false,
            message: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"loading","is_loading":false}"#);
    }
}
