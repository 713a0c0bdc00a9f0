//! codewalk - step-by-step explanations of a block of code.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use codewalk_cli::command_client::CommandClient;
use codewalk_cli::config::Config;
use codewalk_cli::logging::{self, LogConfig, LogFormat};
use codewalk_cli::selection::{load_selection, LineRange};
use codewalk_cli::terminal::{run_interactive, TerminalSink};
use codewalk_core::{
    display_name, render_explanation_prompt, render_question_prompt, AiClient, ContextBuilder, ContextInput,
    SessionHandle, StepGenerator, WalkthroughController,
};
use codewalk_types::{CodeSelection, WalkthroughStep};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

/// Walk through a selection of code one explained step at a time.
#[derive(Parser, Debug)]
#[command(name = "codewalk")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (INFO for every target)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace logging
    #[arg(long, global = true)]
    trace: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "steps=debug").
    /// Targets are prefixed with "codewalk::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the steps generated for a selection
    Steps {
        #[command(flatten)]
        source: SourceArgs,

        /// Print steps as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt that would be sent for a step
    Prompt {
        #[command(flatten)]
        source: SourceArgs,

        /// 1-based step number
        #[arg(long, default_value_t = 1)]
        step: usize,

        /// Render the Q&A prompt for this question instead
        #[arg(long)]
        question: Option<String>,
    },
    /// Run an interactive walkthrough
    Walk {
        #[command(flatten)]
        source: SourceArgs,

        /// Shell command used as the explainer (overrides config)
        #[arg(long, value_name = "CMD")]
        explainer: Option<String>,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Source file
    file: PathBuf,

    /// Line range to select, e.g. "10:42"
    #[arg(short, long, value_name = "START:END")]
    lines: Option<LineRange>,

    /// Language tag (defaults to the file extension)
    #[arg(long)]
    language: Option<String>,
}

impl SourceArgs {
    fn load(&self) -> Result<CodeSelection> {
        load_selection(&self.file, self.lines, self.language.as_deref())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(target: "codewalk::startup", "Loaded configuration: {:?}", config);

    match cli.command {
        Command::Steps { source, json } => print_steps(&source.load()?, json),
        Command::Prompt { source, step, question } => print_prompt(&config, &source.load()?, step, question.as_deref()),
        Command::Walk { source, explainer } => walk(&config, source.load()?, explainer).await,
    }
}

fn generate_steps(selection: &CodeSelection) -> Vec<WalkthroughStep> {
    StepGenerator::new()
        .generate(&selection.content, &selection.language, selection.range.start_line)
        .into_iter()
        .enumerate()
        .map(|(index, step)| WalkthroughStep::from_generated(index, step))
        .collect()
}

fn print_steps(selection: &CodeSelection, json: bool) -> Result<()> {
    let steps = generate_steps(selection);
    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    println!(
        "{} ({}), lines {}-{}: {} steps",
        selection.file_name,
        display_name(&selection.language),
        selection.range.start_line,
        selection.range.end_line,
        steps.len()
    );
    for step in &steps {
        println!(
            "{:>3}. [{:<10}] {:<40} lines {}-{}",
            step.index + 1,
            step.step_type.as_str(),
            step.title,
            step.start_line,
            step.end_line
        );
    }
    Ok(())
}

fn print_prompt(config: &Config, selection: &CodeSelection, step: usize, question: Option<&str>) -> Result<()> {
    let steps = generate_steps(selection);
    if steps.is_empty() {
        bail!("no steps found in {}", selection.file_name);
    }
    let Some(target) = step.checked_sub(1).and_then(|i| steps.get(i)) else {
        bail!("step {} out of range (1-{})", step, steps.len());
    };

    let context = ContextBuilder::new(config.budget()).build(&ContextInput {
        step: target,
        source: &selection.content,
        first_line: selection.range.start_line,
        language: &selection.language,
        file_name: &selection.file_name,
        history: &[],
        variables: None,
    });
    tracing::info!(
        target: "codewalk::cli",
        "Prompt context ~{} tokens (truncated: {})",
        context.estimated_tokens,
        context.truncated
    );

    let prompt = match question {
        Some(q) => render_question_prompt(q, &context),
        None => render_explanation_prompt(&context),
    };
    println!("{}", prompt);
    Ok(())
}

async fn walk(config: &Config, selection: CodeSelection, explainer: Option<String>) -> Result<()> {
    let sink = Arc::new(TerminalSink::stdout());
    let mut controller = WalkthroughController::new(sink.clone()).with_budget(config.budget());

    if let Some(command) = explainer.or_else(|| config.explainer.clone()) {
        let client = CommandClient::new(command, config.model_id.clone());
        if !client.health_check().await {
            tracing::warn!(target: "codewalk::ai", "Explainer `{}` not found on PATH", client.command());
        }
        controller = controller.with_ai_client(Arc::new(client));
    }

    let session = SessionHandle::new();
    controller
        .start(&session, selection)
        .await
        .context("walkthrough could not start (set `explainer` in config or pass --explainer)")?;

    let stdin = BufReader::new(tokio::io::stdin());
    run_interactive(&controller, &session, &sink, stdin).await?;

    let usage = controller.token_usage();
    tracing::info!(
        target: "codewalk::ai",
        "Token usage: {} in, {} out, {} total",
        usage.input_tokens,
        usage.output_tokens,
        usage.total_tokens
    );
    Ok(())
}
