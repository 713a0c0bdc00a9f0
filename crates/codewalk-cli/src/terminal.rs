//! Line-oriented terminal front-end for interactive walkthroughs.

use codewalk_core::{SessionHandle, UiSink, WalkthroughController};
use codewalk_types::{ConversationRole, ConversationTurn, InboundMessage, WalkthroughState, WalkthroughStep};
use std::io::Write;
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};
use uuid::Uuid;

/// [`UiSink`] that prints to a writer (stdout in the binary).
///
/// A step is rendered once when the cursor lands on it; its explanation
/// follows when it arrives.
pub struct TerminalSink {
    out: Mutex<Box<dyn Write + Send>>,
    shown: Mutex<Option<(Uuid, usize)>>,
}

impl TerminalSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            shown: Mutex::new(None),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn write(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", text);
            let _ = out.flush();
        }
    }
}

pub fn format_step(step: &WalkthroughStep, total: usize) -> String {
    let mut text = format!(
        "\n── Step {}/{}: {} [{}] (lines {}-{})\n",
        step.index + 1,
        total,
        step.title,
        step.step_type.as_str(),
        step.start_line,
        step.end_line
    );
    for line in step.code_snippet.lines() {
        text.push_str("  │ ");
        text.push_str(line);
        text.push('\n');
    }
    text
}

impl UiSink for TerminalSink {
    fn post_state_snapshot(&self, state: &WalkthroughState) {
        let Some(step) = state.current_step() else {
            return;
        };
        let key = (state.id, step.index);
        {
            let Ok(mut shown) = self.shown.lock() else {
                return;
            };
            if *shown == Some(key) {
                return;
            }
            *shown = Some(key);
        }

        self.write(&format_step(step, state.steps.len()));
        if let Some(explanation) = &step.explanation {
            self.write(explanation);
        }
    }

    fn post_step_explanation(&self, _step_id: &str, explanation: &str) {
        self.write(explanation);
    }

    fn post_conversation_snapshot(&self, history: &[ConversationTurn]) {
        if let Some(turn) = history.last().filter(|t| t.role == ConversationRole::Assistant) {
            self.write(&format!("\n{}: {}", turn.role.label(), turn.content));
        }
    }

    fn post_error(&self, message: &str) {
        self.write(&format!("error: {}", message));
    }

    fn post_loading(&self, is_loading: bool, message: Option<&str>) {
        if let (true, Some(message)) = (is_loading, message) {
            self.write(&format!("… {}", message));
        }
    }

    fn post_ended(&self, _session_id: Uuid) {
        self.write("Walkthrough ended.");
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Next,
    Previous,
    /// 1-based step number as typed.
    Go(i64),
    Ask(String),
    Code,
    Help,
    Quit,
}

pub const HELP: &str = "Commands: n(ext), p(rev), g N (go to step N), ask <question> / ? <question>, code, help, q(uit)";

/// Parse a line of input; `None` for blank or unrecognised input.
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    if let Some(question) = word.strip_prefix('?') {
        let question = format!("{} {}", question, rest);
        let question = question.trim();
        return (!question.is_empty()).then(|| ReplCommand::Ask(question.to_string()));
    }

    match word {
        "n" | "next" => Some(ReplCommand::Next),
        "p" | "prev" | "previous" => Some(ReplCommand::Previous),
        "g" | "go" | "goto" => rest.parse().ok().map(ReplCommand::Go),
        "ask" if !rest.is_empty() => Some(ReplCommand::Ask(rest.to_string())),
        "code" => Some(ReplCommand::Code),
        "h" | "help" => Some(ReplCommand::Help),
        "q" | "quit" | "exit" => Some(ReplCommand::Quit),
        _ => None,
    }
}

/// Read commands from `input` and drive the walkthrough until quit or EOF.
pub async fn run_interactive<R>(
    controller: &WalkthroughController,
    session: &SessionHandle,
    sink: &TerminalSink,
    input: R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    sink.write(HELP);
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                sink.write(&format!("Unknown command. {}", HELP));
            }
            continue;
        };
        debug!(target: "codewalk::cli", "Command: {:?}", command);

        let message = match command {
            ReplCommand::Next => InboundMessage::NextStep,
            ReplCommand::Previous => InboundMessage::PreviousStep,
            ReplCommand::Go(n) => InboundMessage::GoToStep { index: n - 1 },
            ReplCommand::Ask(question) => InboundMessage::AskQuestion { question },
            ReplCommand::Help => {
                sink.write(HELP);
                continue;
            }
            ReplCommand::Quit => break,
            ReplCommand::Code => {
                let Some(step) = session.snapshot().await.and_then(|s| s.current_step().cloned()) else {
                    continue;
                };
                InboundMessage::GoToCode {
                    start_line: step.start_line,
                    end_line: step.end_line,
                }
            }
        };

        match controller.handle_message(session, message).await {
            Ok(Some(location)) => {
                let file = location
                    .file_path
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                sink.write(&format!("{}:{}-{}", file, location.start_line, location.end_line));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(target: "codewalk::cli", "Command failed: {}", e);
                sink.write(&format!("error: {}", e));
            }
        }
    }

    controller.handle_message(session, InboundMessage::StopWalkthrough).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("n"), Some(ReplCommand::Next));
        assert_eq!(parse_command("  prev "), Some(ReplCommand::Previous));
        assert_eq!(parse_command("g 3"), Some(ReplCommand::Go(3)));
        assert_eq!(parse_command("g x"), None);
        assert_eq!(
            parse_command("ask what is x?"),
            Some(ReplCommand::Ask("what is x?".to_string()))
        );
        assert_eq!(parse_command("? why"), Some(ReplCommand::Ask("why".to_string())));
        assert_eq!(parse_command("?why not"), Some(ReplCommand::Ask("why not".to_string())));
        assert_eq!(parse_command("?"), None);
        assert_eq!(parse_command("ask"), None);
        assert_eq!(parse_command("q"), Some(ReplCommand::Quit));
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_format_step() {
        let step = WalkthroughStep::from_generated(
            1,
            codewalk_types::GeneratedStep {
                start_line: 3,
                end_line: 4,
                code_snippet: "if (a) {\n}".to_string(),
                title: "Conditional check".to_string(),
                step_type: codewalk_types::StepType::Critical,
            },
        );
        let text = format_step(&step, 3);
        assert!(text.contains("Step 2/3: Conditional check [critical] (lines 3-4)"));
        assert!(text.contains("  │ if (a) {\n  │ }\n"));
    }
}
