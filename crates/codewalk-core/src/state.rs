//! Walkthrough session state machine.
//!
//! Owns at most one live [`WalkthroughState`] and broadcasts a
//! [`StateEvent`] for every effective mutation. Readers only ever see
//! snapshots; the state itself is never handed out mutably.

use crate::{CodewalkError, Result};
use codewalk_types::{
    CodeSelection, ConversationRole, ConversationTurn, VariableInfo, WalkthroughMode, WalkthroughState,
    WalkthroughStatus, WalkthroughStep,
};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Notifications raised by the state machine.
#[derive(Debug, Clone)]
pub enum StateEvent {
    /// A new session replaced whatever existed before.
    Created(WalkthroughState),
    /// Status, steps, explanations, variables or mode changed.
    Changed(WalkthroughState),
    /// The cursor moved; carries the newly current step.
    StepChanged(WalkthroughStep),
    /// A conversation turn was appended; carries the whole log.
    ConversationUpdated(Vec<ConversationTurn>),
    /// The session was reset.
    Ended(Uuid),
    /// Status became `error`.
    Error(Option<String>),
}

/// Single-session state machine with its own subscriber registry.
pub struct StateMachine {
    state: Option<WalkthroughState>,
    /// Bumped on every effective mutation.
    version: u64,
    event_tx: broadcast::Sender<StateEvent>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            state: None,
            version: 0,
            event_tx,
        }
    }

    /// Subscribe to state events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    /// Mutation counter; unchanged by no-op calls.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Option<WalkthroughState> {
        self.state.clone()
    }

    /// Whether a session exists and has not failed.
    pub fn is_active(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.status != WalkthroughStatus::Error)
    }

    /// Copy of the step under the cursor.
    pub fn current_step(&self) -> Option<WalkthroughStep> {
        self.state.as_ref().and_then(|s| s.current_step()).cloned()
    }

    /// Start a new session, discarding any previous one.
    pub fn create(&mut self, selection: CodeSelection) -> WalkthroughState {
        let state = WalkthroughState::new(selection);
        info!(
            target: "codewalk::session",
            "Created walkthrough {} for {} (lines {}-{})",
            state.id,
            state.file_name,
            state.selection_range.start_line,
            state.selection_range.end_line
        );
        self.state = Some(state.clone());
        self.touch();
        self.emit(StateEvent::Created(state.clone()));
        state
    }

    /// Update status and error detail.
    ///
    /// Leaving `error` is rejected; only [`reset`](Self::reset) ends an
    /// errored session.
    pub fn set_status(&mut self, status: WalkthroughStatus, error: Option<String>) -> Result<()> {
        let state = self.state.as_mut().ok_or(CodewalkError::NoActiveSession)?;

        if state.status == WalkthroughStatus::Error && status != WalkthroughStatus::Error {
            warn!(
                target: "codewalk::session",
                "Rejected transition out of error for walkthrough {}: -> {}",
                state.id,
                status
            );
            return Err(CodewalkError::InvalidTransition {
                from: state.status,
                to: status,
            });
        }

        debug!(target: "codewalk::session", "Walkthrough {} status {} -> {}", state.id, state.status, status);
        state.status = status;
        state.error = error.clone();
        let snapshot = state.clone();
        self.touch();
        self.emit(StateEvent::Changed(snapshot));

        if status == WalkthroughStatus::Error {
            self.emit(StateEvent::Error(error));
        }
        Ok(())
    }

    /// Replace the step list, reset the cursor and mark the session ready.
    pub fn set_steps(&mut self, steps: Vec<WalkthroughStep>) -> Result<()> {
        let state = self.state.as_mut().ok_or(CodewalkError::NoActiveSession)?;

        if state.status == WalkthroughStatus::Error {
            return Err(CodewalkError::InvalidTransition {
                from: state.status,
                to: WalkthroughStatus::Ready,
            });
        }

        debug!(target: "codewalk::session", "Installing {} steps into walkthrough {}", steps.len(), state.id);
        state.steps = steps;
        state.current_step_index = 0;
        state.status = WalkthroughStatus::Ready;
        let snapshot = state.clone();
        self.touch();
        self.emit(StateEvent::Changed(snapshot));
        Ok(())
    }

    /// Set one step's explanation.
    ///
    /// Returns `false` for an unknown step id or no session; stale responses
    /// for steps that no longer exist are dropped silently. Re-supplying the
    /// same text changes nothing.
    pub fn update_step_explanation(&mut self, step_id: &str, explanation: &str) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let Some(step) = state.steps.iter_mut().find(|s| s.id == step_id) else {
            debug!(target: "codewalk::session", "Ignoring explanation for unknown step {}", step_id);
            return false;
        };
        if step.explanation.as_deref() == Some(explanation) {
            return true;
        }

        step.explanation = Some(explanation.to_string());
        let snapshot = state.clone();
        self.touch();
        self.emit(StateEvent::Changed(snapshot));
        true
    }

    /// Set one step's runtime variables (debug mode).
    pub fn update_step_variables(&mut self, step_id: &str, variables: Vec<VariableInfo>) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let Some(step) = state.steps.iter_mut().find(|s| s.id == step_id) else {
            return false;
        };
        if step.variables.as_ref() == Some(&variables) {
            return true;
        }

        step.variables = Some(variables);
        let snapshot = state.clone();
        self.touch();
        self.emit(StateEvent::Changed(snapshot));
        true
    }

    /// Switch between static and debug mode.
    pub fn set_mode(&mut self, mode: WalkthroughMode) -> Result<()> {
        let state = self.state.as_mut().ok_or(CodewalkError::NoActiveSession)?;
        if state.mode == mode {
            return Ok(());
        }
        state.mode = mode;
        let snapshot = state.clone();
        self.touch();
        self.emit(StateEvent::Changed(snapshot));
        Ok(())
    }

    /// Advance the cursor by one, stopping at the last step.
    pub fn next_step(&mut self) -> Option<WalkthroughStep> {
        let current = self.state.as_ref()?.current_step_index;
        self.move_cursor(current.saturating_add(1))
    }

    /// Move the cursor back by one, stopping at the first step.
    pub fn previous_step(&mut self) -> Option<WalkthroughStep> {
        let current = self.state.as_ref()?.current_step_index;
        self.move_cursor(current.saturating_sub(1))
    }

    /// Jump to `index`, clamped into the step list.
    pub fn go_to_step(&mut self, index: usize) -> Option<WalkthroughStep> {
        self.move_cursor(index)
    }

    /// Clamp and apply a cursor move; returns the step now current.
    fn move_cursor(&mut self, target: usize) -> Option<WalkthroughStep> {
        let state = self.state.as_mut()?;
        if state.steps.is_empty() {
            return None;
        }

        let clamped = target.min(state.steps.len() - 1);
        if clamped != state.current_step_index {
            state.current_step_index = clamped;
            let step = state.steps[clamped].clone();
            debug!(target: "codewalk::session", "Walkthrough {} moved to {}", state.id, step.id);
            self.touch();
            self.emit(StateEvent::StepChanged(step));
        }

        self.current_step()
    }

    /// Append a conversation turn tagged with the current step, if any.
    pub fn add_conversation_turn(&mut self, role: ConversationRole, content: &str) -> Option<ConversationTurn> {
        let state = self.state.as_mut()?;
        let step_id = state.current_step().map(|s| s.id.clone());
        let turn = ConversationTurn::new(role, content, step_id);
        state.conversation_history.push(turn.clone());
        let history = state.conversation_history.clone();
        self.touch();
        self.emit(StateEvent::ConversationUpdated(history));
        Some(turn)
    }

    /// End the session.
    pub fn reset(&mut self) {
        if let Some(state) = self.state.take() {
            info!(target: "codewalk::session", "Walkthrough {} ended", state.id);
            self.touch();
            self.emit(StateEvent::Ended(state.id));
        }
    }
}

/// Shareable handle to one session's state machine.
///
/// The orchestrator takes this explicitly rather than reaching for ambient
/// state, so several independent sessions can coexist.
#[derive(Clone, Default)]
pub struct SessionHandle {
    machine: Arc<RwLock<StateMachine>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a synchronous mutation under the write lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut StateMachine) -> R) -> R {
        let mut machine = self.machine.write().await;
        f(&mut machine)
    }

    /// Run a read-only query under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&StateMachine) -> R) -> R {
        let machine = self.machine.read().await;
        f(&machine)
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> Option<WalkthroughState> {
        self.read(StateMachine::snapshot).await
    }

    /// Subscribe to state events.
    pub async fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.read(StateMachine::subscribe).await
    }
}
