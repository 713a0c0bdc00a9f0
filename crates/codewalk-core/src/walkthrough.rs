//! Walkthrough orchestration.
//!
//! Drives one session through start, navigation and Q&A, calling the AI
//! capability only at explicit suspension points. State is always read as a
//! snapshot and mutated through short synchronous sections on the
//! [`SessionHandle`]; no lock is held across an AI call.

use crate::state::StateMachine;
use crate::{AiClient, CodewalkError, ContextBudget, ContextBuilder, ContextInput, Result, SessionHandle, StepGenerator, UiSink};
use codewalk_types::{
    CodeSelection, ConversationRole, ExplanationContext, InboundMessage, TokenUsage, WalkthroughState,
    WalkthroughStatus, WalkthroughStep,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Assistant turn appended when a question cannot be answered.
pub const QUESTION_FALLBACK: &str = "Sorry, I encountered an error processing your question. Please try again.";

/// Editor location the UI asked to reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocation {
    pub file_path: Option<PathBuf>,
    pub start_line: u32,
    pub end_line: u32,
}

/// Coordinates the step generator, state machine, context builder and the
/// two external boundaries.
pub struct WalkthroughController {
    ai: Option<Arc<dyn AiClient>>,
    ui: Arc<dyn UiSink>,
    generator: StepGenerator,
    context_builder: ContextBuilder,
}

impl WalkthroughController {
    pub fn new(ui: Arc<dyn UiSink>) -> Self {
        Self {
            ai: None,
            ui,
            generator: StepGenerator::new(),
            context_builder: ContextBuilder::default(),
        }
    }

    pub fn with_ai_client(mut self, ai: Arc<dyn AiClient>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.context_builder = ContextBuilder::new(budget);
        self
    }

    pub fn has_ai_client(&self) -> bool {
        self.ai.is_some()
    }

    /// Usage reported by the AI capability, zero when none is configured.
    pub fn token_usage(&self) -> TokenUsage {
        self.ai.as_ref().map(|ai| ai.token_usage()).unwrap_or_default()
    }

    /// Start a walkthrough of `selection` in `session`.
    ///
    /// Without an AI capability nothing is created and
    /// [`CodewalkError::NoAiClient`] is returned. Generation failures put the
    /// session into `error` and are returned as well.
    pub async fn start(&self, session: &SessionHandle, selection: CodeSelection) -> Result<()> {
        info!(target: "codewalk::walkthrough", "Starting walkthrough for {}", selection.file_name);

        let Some(ai) = self.ai.clone() else {
            warn!(target: "codewalk::walkthrough", "No AI client configured, walkthrough not started");
            self.ui
                .post_error("No AI client configured. Configure an explainer to start a walkthrough.");
            return Err(CodewalkError::NoAiClient);
        };

        let state = session.update(|m| m.create(selection)).await;
        self.ui.post_state_snapshot(&state);
        self.ui.post_loading(true, Some("Analyzing code..."));

        match self.prepare(session, ai.as_ref(), &state).await {
            Ok(count) => {
                self.ui.post_loading(false, None);
                info!(target: "codewalk::walkthrough", "Walkthrough {} started with {} steps", state.id, count);
                Ok(())
            }
            Err(e) => {
                error!(target: "codewalk::walkthrough", "Failed to start walkthrough {}: {}", state.id, e);
                let message = e.to_string();
                let marked = session
                    .update(|m| m.set_status(WalkthroughStatus::Error, Some(message)))
                    .await;
                if marked.is_ok() {
                    self.post_snapshot(session).await;
                }
                self.ui
                    .post_error(&format!("Failed to start walkthrough: {}", e));
                self.ui.post_loading(false, None);
                Err(e)
            }
        }
    }

    /// Analyze, install steps and explain the first one.
    async fn prepare(&self, session: &SessionHandle, ai: &dyn AiClient, state: &WalkthroughState) -> Result<usize> {
        session
            .update(|m| m.set_status(WalkthroughStatus::Analyzing, None))
            .await?;
        self.post_snapshot(session).await;

        let generated = self.generator.generate(
            &state.original_code,
            &state.language,
            state.selection_range.start_line,
        );
        if generated.is_empty() {
            return Err(CodewalkError::Generation("no steps found in selection".to_string()));
        }

        let steps: Vec<WalkthroughStep> = generated
            .into_iter()
            .enumerate()
            .map(|(index, step)| WalkthroughStep::from_generated(index, step))
            .collect();
        let count = steps.len();
        let first = steps[0].clone();

        session.update(|m| m.set_steps(steps)).await?;
        session
            .update(|m| m.set_status(WalkthroughStatus::Generating, None))
            .await?;
        self.post_snapshot(session).await;

        self.request_explanation(session, ai, &first).await?;

        session
            .update(|m| m.set_status(WalkthroughStatus::Ready, None))
            .await?;
        self.post_snapshot(session).await;
        Ok(count)
    }

    /// End the session.
    pub async fn stop(&self, session: &SessionHandle) {
        let ended = session
            .update(|m| {
                let id = m.snapshot().map(|s| s.id);
                m.reset();
                id
            })
            .await;
        if let Some(id) = ended {
            info!(target: "codewalk::walkthrough", "Stopped walkthrough {}", id);
            self.ui.post_ended(id);
        }
    }

    /// Move forward one step, explaining it if needed.
    pub async fn next_step(&self, session: &SessionHandle) -> Option<WalkthroughStep> {
        let step = session.update(StateMachine::next_step).await;
        self.after_move(session, step).await
    }

    /// Move back one step, explaining it if needed.
    pub async fn previous_step(&self, session: &SessionHandle) -> Option<WalkthroughStep> {
        let step = session.update(StateMachine::previous_step).await;
        self.after_move(session, step).await
    }

    /// Jump to a step (clamped), explaining it if needed.
    pub async fn go_to_step(&self, session: &SessionHandle, index: usize) -> Option<WalkthroughStep> {
        let step = session.update(|m| m.go_to_step(index)).await;
        self.after_move(session, step).await
    }

    async fn after_move(&self, session: &SessionHandle, step: Option<WalkthroughStep>) -> Option<WalkthroughStep> {
        let step = step?;
        self.post_snapshot(session).await;
        self.ensure_explanation(session, &step).await;
        session.read(StateMachine::current_step).await
    }

    /// Fetch an explanation only when the step has none yet.
    async fn ensure_explanation(&self, session: &SessionHandle, step: &WalkthroughStep) {
        if step.explanation.is_some() {
            return;
        }
        let Some(ai) = self.ai.as_deref() else {
            return;
        };
        if let Err(e) = self.request_explanation(session, ai, step).await {
            warn!(target: "codewalk::walkthrough", "Failed to generate explanation for {}: {}", step.id, e);
        }
    }

    /// Ask the AI capability to explain `step` and store the result by step id.
    async fn request_explanation(&self, session: &SessionHandle, ai: &dyn AiClient, step: &WalkthroughStep) -> Result<()> {
        let state = session.snapshot().await.ok_or(CodewalkError::NoActiveSession)?;
        let context = self.context_for(&state, step);

        debug!(
            target: "codewalk::walkthrough",
            "Requesting explanation for {} (~{} tokens)",
            step.id,
            context.estimated_tokens
        );
        self.ui.post_loading(true, Some("Generating explanation..."));
        let result = ai.generate_explanation(&context).await;
        self.ui.post_loading(false, None);
        let response = result?;

        let applied = session
            .update(|m| m.update_step_explanation(&step.id, &response.text))
            .await;
        if applied {
            self.ui.post_step_explanation(&step.id, &response.text);
            self.post_snapshot(session).await;
        }
        Ok(())
    }

    /// Ask a follow-up question about the current step.
    ///
    /// The user's turn is recorded before the AI call; the answer, or
    /// [`QUESTION_FALLBACK`] when there is none, follows it.
    pub async fn ask_question(&self, session: &SessionHandle, question: &str) -> Result<()> {
        let ai = self.ai.clone().ok_or(CodewalkError::NoAiClient)?;
        let state = session.snapshot().await.ok_or(CodewalkError::NoActiveSession)?;
        debug!(target: "codewalk::walkthrough", "User question: {}", question);

        let history = session
            .update(|m| {
                m.add_conversation_turn(ConversationRole::User, question);
                m.snapshot().map(|s| s.conversation_history)
            })
            .await
            .unwrap_or_default();
        self.ui.post_conversation_snapshot(&history);
        self.ui.post_loading(true, Some("Thinking..."));

        let answer = match state.current_step() {
            Some(step) => {
                let context = self.context_for(&state, step);
                ai.answer_question(question, &context).await.map(|r| r.text)
            }
            None => Err(CodewalkError::AiRequest("no current step to ask about".to_string())),
        };
        let content = answer.unwrap_or_else(|e| {
            warn!(target: "codewalk::walkthrough", "Failed to answer question: {}", e);
            QUESTION_FALLBACK.to_string()
        });

        let history = session
            .update(|m| {
                m.add_conversation_turn(ConversationRole::Assistant, &content);
                m.snapshot().map(|s| s.conversation_history)
            })
            .await
            .unwrap_or_default();
        self.ui.post_conversation_snapshot(&history);
        self.ui.post_loading(false, None);
        Ok(())
    }

    /// Dispatch one UI message.
    ///
    /// Returns the location to reveal for `go_to_code`; every other message
    /// yields `None`.
    pub async fn handle_message(&self, session: &SessionHandle, message: InboundMessage) -> Result<Option<CodeLocation>> {
        match message {
            InboundMessage::Ready => {
                self.post_snapshot(session).await;
            }
            InboundMessage::GoToStep { index } => {
                self.go_to_step(session, usize::try_from(index).unwrap_or(0)).await;
            }
            InboundMessage::NextStep => {
                self.next_step(session).await;
            }
            InboundMessage::PreviousStep => {
                self.previous_step(session).await;
            }
            InboundMessage::AskQuestion { question } => {
                self.ask_question(session, &question).await?;
            }
            InboundMessage::StopWalkthrough => {
                self.stop(session).await;
            }
            InboundMessage::GoToCode { start_line, end_line } => {
                let file_path = session.snapshot().await.map(|s| s.source_file);
                return Ok(Some(CodeLocation {
                    file_path,
                    start_line,
                    end_line,
                }));
            }
        }
        Ok(None)
    }

    fn context_for(&self, state: &WalkthroughState, step: &WalkthroughStep) -> ExplanationContext {
        // prefer the installed copy so variables set since are included
        let step = state.steps.iter().find(|s| s.id == step.id).unwrap_or(step);
        self.context_builder.build(&ContextInput {
            step,
            source: &state.original_code,
            first_line: state.selection_range.start_line,
            language: &state.language,
            file_name: &state.file_name,
            history: &state.conversation_history,
            variables: step.variables.as_deref(),
        })
    }

    async fn post_snapshot(&self, session: &SessionHandle) {
        if let Some(state) = session.snapshot().await {
            self.ui.post_state_snapshot(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelSink;
    use codewalk_types::{ExplanationResponse, OutboundMessage, SelectionRange};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    const SOURCE: &str = "const x = 1;\nconst y = 2;\nif (x > y) {\n  return x;\n}\n";

    #[derive(Default)]
    struct MockAi {
        fail_explanations: AtomicBool,
        fail_questions: AtomicBool,
        explanation_calls: AtomicUsize,
        question_contexts: Mutex<Vec<ExplanationContext>>,
    }

    #[async_trait::async_trait]
    impl AiClient for MockAi {
        async fn generate_explanation(&self, context: &ExplanationContext) -> Result<ExplanationResponse> {
            self.explanation_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_explanations.load(Ordering::SeqCst) {
                return Err(CodewalkError::AiRequest("connection refused".to_string()));
            }
            Ok(ExplanationResponse {
                text: format!("Explains {}", context.step.title),
                model_id: "mock".to_string(),
                tokens_used: 10,
            })
        }

        async fn answer_question(&self, question: &str, context: &ExplanationContext) -> Result<ExplanationResponse> {
            self.question_contexts.lock().unwrap().push(context.clone());
            if self.fail_questions.load(Ordering::SeqCst) {
                return Err(CodewalkError::AiRequest("timeout".to_string()));
            }
            Ok(ExplanationResponse {
                text: format!("Answer to {}", question),
                model_id: "mock".to_string(),
                tokens_used: 10,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn token_usage(&self) -> TokenUsage {
            TokenUsage::default()
        }
    }

    fn selection(content: &str) -> CodeSelection {
        CodeSelection {
            file_path: PathBuf::from("/project/src/compare.ts"),
            file_name: "compare.ts".to_string(),
            range: SelectionRange::lines(1, 5),
            content: content.to_string(),
            language: "typescript".to_string(),
        }
    }

    fn controller(ai: &Arc<MockAi>) -> (WalkthroughController, UnboundedReceiver<OutboundMessage>) {
        let (sink, rx) = ChannelSink::channel();
        let controller = WalkthroughController::new(Arc::new(sink)).with_ai_client(ai.clone());
        (controller, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_start_without_ai_client_creates_nothing() {
        let (sink, mut rx) = ChannelSink::channel();
        let controller = WalkthroughController::new(Arc::new(sink));
        let session = SessionHandle::new();

        let err = controller.start(&session, selection(SOURCE)).await.unwrap_err();

        assert!(matches!(err, CodewalkError::NoAiClient));
        assert!(session.snapshot().await.is_none());
        assert!(matches!(drain(&mut rx).as_slice(), [OutboundMessage::Error { .. }]));
    }

    #[tokio::test]
    async fn test_start_installs_steps_and_explains_first() {
        let ai = Arc::new(MockAi::default());
        let (controller, mut rx) = controller(&ai);
        let session = SessionHandle::new();

        controller.start(&session, selection(SOURCE)).await.unwrap();

        let state = session.snapshot().await.unwrap();
        assert_eq!(state.status, WalkthroughStatus::Ready);
        assert_eq!(state.steps.len(), 3);
        assert_eq!(state.steps[2].id, "step-2");
        assert_eq!(state.steps[0].explanation.as_deref(), Some("Explains Initialize x"));
        assert!(state.steps[1].explanation.is_none());
        assert_eq!(ai.explanation_calls.load(Ordering::SeqCst), 1);

        let messages = drain(&mut rx);
        assert!(messages.iter().any(
            |m| matches!(m, OutboundMessage::StepExplanation { step_id, .. } if step_id == "step-0")
        ));
        assert_eq!(
            messages.last(),
            Some(&OutboundMessage::Loading {
                is_loading: false,
                message: None
            })
        );
    }

    #[tokio::test]
    async fn test_start_with_no_code_is_generation_error() {
        let ai = Arc::new(MockAi::default());
        let (controller, mut rx) = controller(&ai);
        let session = SessionHandle::new();

        let err = controller.start(&session, selection("\n  \n")).await.unwrap_err();

        assert!(matches!(err, CodewalkError::Generation(_)));
        let state = session.snapshot().await.unwrap();
        assert_eq!(state.status, WalkthroughStatus::Error);
        assert!(state.error.is_some());

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| matches!(m, OutboundMessage::Error { .. })));
        assert!(matches!(
            messages.last(),
            Some(OutboundMessage::Loading { is_loading: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_start_fails_when_first_explanation_fails() {
        let ai = Arc::new(MockAi::default());
        ai.fail_explanations.store(true, Ordering::SeqCst);
        let (controller, _rx) = controller(&ai);
        let session = SessionHandle::new();

        let err = controller.start(&session, selection(SOURCE)).await.unwrap_err();

        assert!(matches!(err, CodewalkError::AiRequest(_)));
        let state = session.snapshot().await.unwrap();
        assert_eq!(state.status, WalkthroughStatus::Error);
        assert_eq!(state.steps.len(), 3);
    }

    #[tokio::test]
    async fn test_navigation_fetches_each_explanation_once() {
        let ai = Arc::new(MockAi::default());
        let (controller, _rx) = controller(&ai);
        let session = SessionHandle::new();
        controller.start(&session, selection(SOURCE)).await.unwrap();

        let step = controller.next_step(&session).await.unwrap();
        assert_eq!(step.index, 1);
        assert_eq!(step.explanation.as_deref(), Some("Explains Initialize y"));
        assert_eq!(ai.explanation_calls.load(Ordering::SeqCst), 2);

        controller.previous_step(&session).await.unwrap();
        controller.next_step(&session).await.unwrap();
        assert_eq!(ai.explanation_calls.load(Ordering::SeqCst), 2);

        let step = controller.go_to_step(&session, 10).await.unwrap();
        assert_eq!(step.index, 2);
        assert_eq!(ai.explanation_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_navigation_survives_ai_failure() {
        let ai = Arc::new(MockAi::default());
        let (controller, mut rx) = controller(&ai);
        let session = SessionHandle::new();
        controller.start(&session, selection(SOURCE)).await.unwrap();
        drain(&mut rx);
        ai.fail_explanations.store(true, Ordering::SeqCst);

        let step = controller.next_step(&session).await.unwrap();

        assert_eq!(step.index, 1);
        assert!(step.explanation.is_none());
        let state = session.snapshot().await.unwrap();
        assert_eq!(state.status, WalkthroughStatus::Ready);
        assert_eq!(
            drain(&mut rx).last(),
            Some(&OutboundMessage::Loading {
                is_loading: false,
                message: None
            })
        );
    }

    #[tokio::test]
    async fn test_ask_question_records_both_turns() {
        let ai = Arc::new(MockAi::default());
        let (controller, mut rx) = controller(&ai);
        let session = SessionHandle::new();
        controller.start(&session, selection(SOURCE)).await.unwrap();
        drain(&mut rx);

        controller.ask_question(&session, "why compare?").await.unwrap();

        let history = session.snapshot().await.unwrap().conversation_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ConversationRole::User);
        assert_eq!(history[0].content, "why compare?");
        assert_eq!(history[0].step_id.as_deref(), Some("step-0"));
        assert_eq!(history[1].content, "Answer to why compare?");

        // context was captured before the question was appended
        let contexts = ai.question_contexts.lock().unwrap();
        assert!(contexts[0].conversation_history.is_empty());

        let messages = drain(&mut rx);
        assert!(matches!(
            &messages[0],
            OutboundMessage::ConversationUpdate { history } if history.len() == 1
        ));
    }

    #[tokio::test]
    async fn test_ask_question_failure_appends_fallback() {
        let ai = Arc::new(MockAi::default());
        ai.fail_questions.store(true, Ordering::SeqCst);
        let (controller, _rx) = controller(&ai);
        let session = SessionHandle::new();
        controller.start(&session, selection(SOURCE)).await.unwrap();

        controller.ask_question(&session, "huh?").await.unwrap();

        let state = session.snapshot().await.unwrap();
        assert_eq!(state.conversation_history[1].content, QUESTION_FALLBACK);
        assert_eq!(state.status, WalkthroughStatus::Ready);
    }

    #[tokio::test]
    async fn test_ask_question_without_session() {
        let ai = Arc::new(MockAi::default());
        let (controller, _rx) = controller(&ai);
        let session = SessionHandle::new();

        let err = controller.ask_question(&session, "anyone?").await.unwrap_err();
        assert!(matches!(err, CodewalkError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_handle_message_dispatch() {
        let ai = Arc::new(MockAi::default());
        let (controller, mut rx) = controller(&ai);
        let session = SessionHandle::new();
        controller.start(&session, selection(SOURCE)).await.unwrap();

        controller
            .handle_message(&session, InboundMessage::GoToStep { index: 2 })
            .await
            .unwrap();
        controller
            .handle_message(&session, InboundMessage::GoToStep { index: -4 })
            .await
            .unwrap();
        assert_eq!(session.snapshot().await.unwrap().current_step_index, 0);

        let version = session.read(StateMachine::version).await;
        let location = controller
            .handle_message(
                &session,
                InboundMessage::GoToCode {
                    start_line: 3,
                    end_line: 5,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            location,
            Some(CodeLocation {
                file_path: Some(PathBuf::from("/project/src/compare.ts")),
                start_line: 3,
                end_line: 5,
            })
        );
        assert_eq!(session.read(StateMachine::version).await, version);

        drain(&mut rx);
        controller.handle_message(&session, InboundMessage::Ready).await.unwrap();
        assert!(matches!(drain(&mut rx).as_slice(), [OutboundMessage::StateUpdate { .. }]));

        controller
            .handle_message(&session, InboundMessage::StopWalkthrough)
            .await
            .unwrap();
        assert!(session.snapshot().await.is_none());
        assert!(matches!(drain(&mut rx).as_slice(), [OutboundMessage::Ended { .. }]));
    }
}
