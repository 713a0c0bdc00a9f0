//! Follow-up Q&A log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn label(&self) -> &'static str {
        match self {
            ConversationRole::User => "User",
            ConversationRole::Assistant => "Assistant",
        }
    }
}

/// One message in the append-only conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: ConversationRole,
    pub content: String,
    /// Step that was current when the turn was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with a fresh id and the current time.
    pub fn new(role: ConversationRole, content: impl Into<String>, step_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            step_id,
            timestamp: Utc::now(),
        }
    }
}
