//! AI capability backed by an external shell command.
//!
//! The rendered prompt is written to the command's stdin and its stdout is
//! taken as the answer. Anything that speaks that protocol works: an LLM CLI,
//! a script wrapping an HTTP API, or `cat` for a dry run.

use codewalk_core::{
    estimate_tokens, render_explanation_prompt, render_question_prompt, AiClient, CodewalkError, Result,
};
use codewalk_types::{ExplanationContext, ExplanationResponse, TokenUsage};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

pub struct CommandClient {
    command: String,
    model_id: String,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

impl CommandClient {
    pub fn new(command: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            model_id: model_id.into(),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command once with `prompt` on stdin.
    async fn run(&self, prompt: String) -> Result<ExplanationResponse> {
        debug!(target: "codewalk::ai", "Running explainer `{}` ({} chars)", self.command, prompt.len());

        let mut child = shell_command(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(target: "codewalk::ai", "Failed to spawn explainer: {}", e);
                CodewalkError::AiRequest(format!("failed to spawn `{}`: {}", self.command, e))
            })?;

        // Feed stdin concurrently so a chatty command can't fill its stdout pipe first.
        let input_tokens = estimate_tokens(&prompt) as u64;
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let result = stdin.write_all(prompt.as_bytes()).await;
                drop(stdin);
                result
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CodewalkError::AiRequest(format!("explainer failed: {}", e)))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The command may exit without reading all of stdin.
                Ok(Err(e)) => debug!(target: "codewalk::ai", "Explainer closed stdin early: {}", e),
                Err(e) => debug!(target: "codewalk::ai", "Stdin writer task failed: {}", e),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CodewalkError::AiRequest(format!(
                "explainer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(CodewalkError::AiRequest("explainer produced no output".to_string()));
        }

        let output_tokens = estimate_tokens(&text) as u64;
        self.input_tokens.fetch_add(input_tokens, Ordering::Relaxed);
        self.output_tokens.fetch_add(output_tokens, Ordering::Relaxed);

        Ok(ExplanationResponse {
            text,
            model_id: self.model_id.clone(),
            tokens_used: input_tokens + output_tokens,
        })
    }
}

#[async_trait::async_trait]
impl AiClient for CommandClient {
    async fn generate_explanation(&self, context: &ExplanationContext) -> Result<ExplanationResponse> {
        self.run(render_explanation_prompt(context)).await
    }

    async fn answer_question(&self, question: &str, context: &ExplanationContext) -> Result<ExplanationResponse> {
        self.run(render_question_prompt(question, context)).await
    }

    async fn health_check(&self) -> bool {
        let Some(program) = self.command.split_whitespace().next() else {
            return false;
        };
        resolve_program(program)
    }

    fn token_usage(&self) -> TokenUsage {
        let mut usage = TokenUsage::default();
        usage.record(
            self.input_tokens.load(Ordering::Relaxed),
            self.output_tokens.load(Ordering::Relaxed),
        );
        usage
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Whether `program` is a path to a file or a name found on `PATH`.
fn resolve_program(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        return Path::new(program).is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}
