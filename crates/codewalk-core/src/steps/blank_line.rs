//! Fallback strategy: blank lines delimit steps.

use codewalk_types::{GeneratedStep, StepType};

use super::SegmentationStrategy;

/// Longest title kept before truncating with an ellipsis.
const MAX_TITLE_CHARS: usize = 40;

/// Splits source into maximal runs of non-blank lines.
pub(crate) struct BlankLineStrategy {
    comment_prefix: &'static str,
}

impl BlankLineStrategy {
    pub(crate) fn new(comment_prefix: &'static str) -> Self {
        Self { comment_prefix }
    }

    fn is_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with(self.comment_prefix)
    }

    fn build_step(&self, run: &[&str], start_line: u32) -> Option<GeneratedStep> {
        // A run made only of comments carries nothing to explain.
        let first_code = run.iter().find(|l| !self.is_comment(l))?;
        Some(GeneratedStep {
            start_line,
            end_line: start_line + run.len() as u32 - 1,
            code_snippet: run.join("\n"),
            title: truncate_title(first_code.trim()),
            step_type: StepType::Supporting,
        })
    }
}

impl SegmentationStrategy for BlankLineStrategy {
    fn name(&self) -> &'static str {
        "blank_line"
    }

    fn segment(&self, lines: &[&str], first_line: u32) -> Vec<GeneratedStep> {
        let mut steps = Vec::new();
        let mut run_start: Option<usize> = None;

        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                if let Some(start) = run_start.take() {
                    steps.extend(self.build_step(&lines[start..idx], first_line + start as u32));
                }
            } else if run_start.is_none() {
                run_start = Some(idx);
            }
        }

        if let Some(start) = run_start {
            steps.extend(self.build_step(&lines[start..], first_line + start as u32));
        }

        steps
    }
}

fn truncate_title(line: &str) -> String {
    if line.chars().count() <= MAX_TITLE_CHARS {
        return line.to_string();
    }
    let head: String = line.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{}...", head)
}
