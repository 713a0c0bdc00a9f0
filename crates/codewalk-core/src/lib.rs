//! Core walkthrough engine for Codewalk.
//!
//! Turns a selected block of source code into explainable steps, tracks the
//! walkthrough session that navigates them, and bounds the context handed to
//! the external AI capability.

mod ai;
mod context;
mod error;
mod language;
mod prompt;
mod state;
mod steps;
mod ui;
mod walkthrough;

pub use ai::AiClient;
pub use context::{estimate_tokens, ContextBudget, ContextBuilder, ContextInput};
pub use error::CodewalkError;
pub use language::{comment_prefix, display_name, language_for_path};
pub use prompt::{render_explanation_prompt, render_question_prompt};
pub use state::{SessionHandle, StateEvent, StateMachine};
pub use steps::{consolidate_steps, StepGenerator};
pub use ui::{ChannelSink, UiSink};
pub use walkthrough::{CodeLocation, WalkthroughController, QUESTION_FALLBACK};

/// Result type for Codewalk operations.
pub type Result<T> = std::result::Result<T, CodewalkError>;
