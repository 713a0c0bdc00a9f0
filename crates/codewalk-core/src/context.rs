//! Token-budgeted context assembly for AI requests.

use crate::language::comment_prefix;
use codewalk_types::{ConversationTurn, ExplanationContext, VariableInfo, WalkthroughStep};
use tracing::debug;

/// Runtime variables beyond this count are never sent.
const MAX_VARIABLES: usize = 10;

/// Estimated token cost of `text`: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Total token budget and the share held back for the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_tokens: usize,
    pub reserved_for_response: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            reserved_for_response: 1500,
        }
    }
}

impl ContextBudget {
    /// Tokens available to the request itself.
    pub fn available(&self) -> usize {
        self.max_tokens.saturating_sub(self.reserved_for_response)
    }
}

/// Everything the builder reads for one request.
#[derive(Debug, Clone, Copy)]
pub struct ContextInput<'a> {
    pub step: &'a WalkthroughStep,
    /// The selected source text.
    pub source: &'a str,
    /// File line number of the first line of `source`.
    pub first_line: u32,
    pub language: &'a str,
    pub file_name: &'a str,
    pub history: &'a [ConversationTurn],
    pub variables: Option<&'a [VariableInfo]>,
}

/// Builds [`ExplanationContext`]s under a [`ContextBudget`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder {
    budget: ContextBudget,
}

impl ContextBuilder {
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> ContextBudget {
        self.budget
    }

    /// Assemble the context in priority order: step, code, variables, history.
    ///
    /// An oversized source is windowed to `min(40% of available, available - step)`
    /// tokens, so step, code and variables stay within
    /// [`ContextBudget::available`] whenever the step's own lines fit that window.
    /// A step larger than the window is still sent whole with its markers, and
    /// `estimated_tokens` can then exceed `available()`. Variables and history
    /// are only added while they fit, so they never push past the budget.
    pub fn build(&self, input: &ContextInput<'_>) -> ExplanationContext {
        let available = self.budget.available();
        let step_tokens = estimate_tokens(&input.step.code_snippet);
        let code_tokens = estimate_tokens(input.source);

        let (full_code, truncated) = if (step_tokens + code_tokens) * 5 > available * 3 {
            let window_budget = (available * 2 / 5).min(available.saturating_sub(step_tokens));
            self.window(input, window_budget)
        } else {
            (input.source.to_string(), false)
        };

        let mut used = step_tokens + estimate_tokens(&full_code);

        let variables = input.variables.map(|vars| {
            let mut kept = Vec::new();
            for var in vars.iter().take(MAX_VARIABLES) {
                let cost = variable_cost(var);
                if used + cost > available {
                    break;
                }
                used += cost;
                kept.push(var.clone());
            }
            kept
        });

        let mut conversation_history = Vec::new();
        for turn in input.history.iter().rev() {
            let cost = estimate_tokens(&turn.content);
            if used + cost > available {
                break;
            }
            used += cost;
            conversation_history.push(turn.clone());
        }
        conversation_history.reverse();

        debug!(
            target: "codewalk::context",
            "Context for {}: {} tokens of {} (truncated: {}, history {}/{})",
            input.step.id,
            used,
            available,
            truncated,
            conversation_history.len(),
            input.history.len()
        );

        ExplanationContext {
            step: input.step.clone(),
            full_code,
            language: input.language.to_string(),
            file_name: input.file_name.to_string(),
            conversation_history,
            variables,
            truncated,
            estimated_tokens: used,
        }
    }

    /// Cut the source down to a symmetric window around the step that fits
    /// `budget`. The step's own lines are always kept.
    fn window(&self, input: &ContextInput<'_>, budget: usize) -> (String, bool) {
        let lines: Vec<&str> = input.source.lines().collect();
        if lines.is_empty() {
            return (String::new(), false);
        }
        let last = lines.len() - 1;
        let to_index = |line: u32| (line.saturating_sub(input.first_line) as usize).min(last);

        let mut lo = to_index(input.step.start_line);
        let mut hi = to_index(input.step.end_line).max(lo);
        let prefix = comment_prefix(input.language);

        loop {
            let next_lo = lo.saturating_sub(1);
            let next_hi = (hi + 1).min(last);
            if next_lo == lo && next_hi == hi {
                break;
            }
            if estimate_tokens(&render_window(&lines, next_lo, next_hi, prefix)) > budget {
                break;
            }
            lo = next_lo;
            hi = next_hi;
        }

        let truncated = lo > 0 || hi < last;
        if !truncated {
            return (input.source.to_string(), false);
        }
        (render_window(&lines, lo, hi, prefix), true)
    }
}

fn render_window(lines: &[&str], lo: usize, hi: usize, prefix: &str) -> String {
    let mut out = String::new();
    if lo > 0 {
        out.push_str(&format!("{} ... (code above truncated)\n\n", prefix));
    }
    out.push_str(&lines[lo..=hi].join("\n"));
    if hi + 1 < lines.len() {
        out.push_str(&format!("\n\n{} ... (code below truncated)", prefix));
    }
    out
}

fn variable_cost(var: &VariableInfo) -> usize {
    let rendered = serde_json::to_string(var).unwrap_or_else(|_| format!("{} = {}", var.name, var.value));
    estimate_tokens(&rendered)
}
