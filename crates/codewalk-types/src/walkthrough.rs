//! Walkthrough steps and session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::{CodeSelection, ConversationTurn, SelectionRange};

/// Heuristic importance tier of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Detail,
    Supporting,
    Critical,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Critical => "critical",
            StepType::Supporting => "supporting",
            StepType::Detail => "detail",
        }
    }
}

/// A candidate step produced by the step generator.
///
/// Line numbers are 1-based, inclusive and expressed in the coordinate space
/// of the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStep {
    pub start_line: u32,
    pub end_line: u32,
    pub code_snippet: String,
    pub title: String,
    pub step_type: StepType,
}

/// Scope of a runtime variable captured in debug mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Local,
    Parameter,
    Member,
    Global,
}

/// A runtime variable binding shown alongside a step in debug mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub scope: VariableScope,
    #[serde(default)]
    pub is_expandable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<VariableInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluate_error: Option<String>,
}

/// A step installed in a walkthrough session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkthroughStep {
    /// Stable identifier (`step-<index>`).
    pub id: String,
    pub index: usize,
    pub start_line: u32,
    pub end_line: u32,
    pub code_snippet: String,
    pub title: String,
    pub step_type: StepType,
    /// AI explanation, absent until a request succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Runtime bindings (debug mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<VariableInfo>>,
}

impl WalkthroughStep {
    /// Assign an identity to a generated step.
    pub fn from_generated(index: usize, step: GeneratedStep) -> Self {
        Self {
            id: format!("step-{}", index),
            index,
            start_line: step.start_line,
            end_line: step.end_line,
            code_snippet: step.code_snippet,
            title: step.title,
            step_type: step.step_type,
            explanation: None,
            variables: None,
        }
    }
}

/// Walkthrough status in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkthroughStatus {
    /// Session created, nothing analyzed yet.
    Initializing,
    /// Source is being segmented into steps.
    Analyzing,
    /// Explanations are being generated.
    Generating,
    /// Steps are installed and navigable.
    Ready,
    /// Session failed; only a reset leaves this state.
    Error,
}

impl std::fmt::Display for WalkthroughStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WalkthroughStatus::Initializing => "initializing",
            WalkthroughStatus::Analyzing => "analyzing",
            WalkthroughStatus::Generating => "generating",
            WalkthroughStatus::Ready => "ready",
            WalkthroughStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Whether steps carry runtime variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkthroughMode {
    #[default]
    Static,
    Debug,
}

/// The full state of one walkthrough session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkthroughState {
    pub id: Uuid,
    pub status: WalkthroughStatus,
    pub mode: WalkthroughMode,
    pub source_file: PathBuf,
    pub file_name: String,
    pub language: String,
    pub selection_range: SelectionRange,
    pub original_code: String,
    pub steps: Vec<WalkthroughStep>,
    pub current_step_index: usize,
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WalkthroughState {
    /// Fresh `initializing` state for a selection.
    pub fn new(selection: CodeSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: WalkthroughStatus::Initializing,
            mode: WalkthroughMode::Static,
            source_file: selection.file_path,
            file_name: selection.file_name,
            language: selection.language,
            selection_range: selection.range,
            original_code: selection.content,
            steps: Vec::new(),
            current_step_index: 0,
            conversation_history: Vec::new(),
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Step under the cursor, if any steps are installed.
    pub fn current_step(&self) -> Option<&WalkthroughStep> {
        self.steps.get(self.current_step_index)
    }
}
