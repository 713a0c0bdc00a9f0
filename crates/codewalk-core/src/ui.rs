//! Boundary to whatever renders the walkthrough.

use codewalk_types::{ConversationTurn, OutboundMessage, WalkthroughState};
use tokio::sync::mpsc;
use tracing::trace;

/// Receives snapshots and notices from the orchestrator.
///
/// Posting is fire-and-forget; a sink that has gone away just drops messages.
pub trait UiSink: Send + Sync {
    fn post_state_snapshot(&self, state: &WalkthroughState);

    fn post_step_explanation(&self, step_id: &str, explanation: &str);

    fn post_conversation_snapshot(&self, history: &[ConversationTurn]);

    fn post_error(&self, message: &str);

    fn post_loading(&self, is_loading: bool, message: Option<&str>);

    /// Session ended.
    fn post_ended(&self, _session_id: uuid::Uuid) {}
}

/// [`UiSink`] that forwards every post as an [`OutboundMessage`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, msg: OutboundMessage) {
        if self.tx.send(msg).is_err() {
            trace!(target: "codewalk::walkthrough", "UI receiver dropped, discarding message");
        }
    }
}

impl UiSink for ChannelSink {
    fn post_state_snapshot(&self, state: &WalkthroughState) {
        self.send(OutboundMessage::StateUpdate {
            state: Box::new(state.clone()),
        });
    }

    fn post_step_explanation(&self, step_id: &str, explanation: &str) {
        self.send(OutboundMessage::StepExplanation {
            step_id: step_id.to_string(),
            explanation: explanation.to_string(),
        });
    }

    fn post_conversation_snapshot(&self, history: &[ConversationTurn]) {
        self.send(OutboundMessage::ConversationUpdate {
            history: history.to_vec(),
        });
    }

    fn post_error(&self, message: &str) {
        self.send(OutboundMessage::Error {
            message: message.to_string(),
        });
    }

    fn post_loading(&self, is_loading: bool, message: Option<&str>) {
        self.send(OutboundMessage::Loading {
            is_loading,
            message: message.map(str::to_string),
        });
    }

    fn post_ended(&self, session_id: uuid::Uuid) {
        self.send(OutboundMessage::Ended { session_id });
    }
}
