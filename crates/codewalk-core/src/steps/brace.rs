//! Brace-depth scanner shared by the C-like language strategies.

use codewalk_types::{GeneratedStep, StepType};

use super::classify::{classify_line, classify_lines, is_skipped};
use super::SegmentationStrategy;

/// Deepest nesting level at which a new step may open.
const MAX_OPEN_DEPTH: i32 = 1;

/// Language-specific predicates driving [`BraceScanner`].
pub(crate) trait BraceRules: Send + Sync {
    /// Strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Whether a trimmed line starts a new step.
    fn opens_step(&self, trimmed: &str) -> bool;

    /// Whether `},` at depth 0 also closes a step.
    fn closes_on_trailing_comma(&self) -> bool {
        false
    }

    /// Advisory title for a step opened by `trimmed`.
    fn title(&self, trimmed: &str) -> String;
}

/// Line scanner that opens steps on syntactic start patterns and closes them
/// on statement terminators or balanced closing braces.
pub(crate) struct BraceScanner<R>(pub R);

/// A step that has opened but not yet closed.
struct OpenStep<'a> {
    start_line: u32,
    end_line: u32,
    open_depth: i32,
    snippet: String,
    title: String,
    step_type: StepType,
    /// Skipped lines seen since the last code line.
    pending: Vec<&'a str>,
}

impl<'a> OpenStep<'a> {
    fn new(line_no: u32, depth: i32, line: &str, title: String, step_type: StepType) -> Self {
        Self {
            start_line: line_no,
            end_line: line_no,
            open_depth: depth,
            snippet: line.to_string(),
            title,
            step_type,
            pending: Vec::new(),
        }
    }

    fn push(&mut self, line_no: u32, line: &str, trimmed: &str) {
        for skipped in self.pending.drain(..) {
            self.snippet.push('\n');
            self.snippet.push_str(skipped);
        }
        self.snippet.push('\n');
        self.snippet.push_str(line);
        self.end_line = line_no;
        self.step_type = self.step_type.max(classify_line(trimmed));
    }

    fn finish(self) -> GeneratedStep {
        GeneratedStep {
            start_line: self.start_line,
            end_line: self.end_line,
            code_snippet: self.snippet,
            title: self.title,
            step_type: self.step_type,
        }
    }
}

/// Net `{` minus `}` on a line.
fn brace_delta(line: &str) -> i32 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

impl<R: BraceRules> BraceScanner<R> {
    fn closes_step(&self, trimmed: &str, depth: i32, open_depth: i32) -> bool {
        if trimmed.ends_with(';') && depth <= open_depth {
            return true;
        }
        depth == 0
            && (trimmed.ends_with('}') || (self.0.closes_on_trailing_comma() && trimmed.ends_with("},")))
    }
}

impl<R: BraceRules> SegmentationStrategy for BraceScanner<R> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn segment(&self, lines: &[&str], first_line: u32) -> Vec<GeneratedStep> {
        let mut steps: Vec<GeneratedStep> = Vec::new();
        let mut open: Option<OpenStep<'_>> = None;
        let mut depth: i32 = 0;
        let mut first_code: Option<usize> = None;
        let mut last_code: Option<usize> = None;

        for (idx, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            let line_no = first_line + idx as u32;

            if is_skipped(trimmed) {
                if let Some(step) = open.as_mut() {
                    step.pending.push(line);
                }
                continue;
            }

            first_code.get_or_insert(idx);
            last_code = Some(idx);

            match open.as_mut() {
                Some(step) => step.push(line_no, line, trimmed),
                None if depth <= MAX_OPEN_DEPTH && self.0.opens_step(trimmed) => {
                    open = Some(OpenStep::new(
                        line_no,
                        depth,
                        line,
                        self.0.title(trimmed),
                        classify_line(trimmed),
                    ));
                }
                None => {}
            }

            // Selections can start inside a block; unmatched `}` never go below 0.
            depth = (depth + brace_delta(line)).max(0);

            let closes = open
                .as_ref()
                .is_some_and(|step| self.closes_step(trimmed, depth, step.open_depth));
            if closes {
                if let Some(step) = open.take() {
                    steps.push(step.finish());
                }
            }
        }

        // Unclosed step at end of input keeps its partial content.
        if let Some(step) = open.take() {
            steps.push(step.finish());
        }

        let (Some(first_code), Some(last_code)) = (first_code, last_code) else {
            return steps;
        };

        match steps.last_mut() {
            Some(last) => absorb_trailing(last, lines, first_line, last_code),
            None => {
                let covered = &lines[first_code..=last_code];
                steps.push(GeneratedStep {
                    start_line: first_line + first_code as u32,
                    end_line: first_line + last_code as u32,
                    code_snippet: covered.join("\n"),
                    title: self.0.title(lines[first_code].trim()),
                    step_type: classify_lines(covered.iter().copied()),
                });
            }
        }

        steps
    }
}

/// Extend the final step over code lines that never opened a step of their own.
fn absorb_trailing(step: &mut GeneratedStep, lines: &[&str], first_line: u32, last_code: usize) {
    let end_idx = (step.end_line - first_line) as usize;
    if last_code <= end_idx {
        return;
    }
    for line in &lines[end_idx + 1..=last_code] {
        step.code_snippet.push('\n');
        step.code_snippet.push_str(line);
        let trimmed = line.trim();
        if !is_skipped(trimmed) {
            step.step_type = step.step_type.max(classify_line(trimmed));
        }
    }
    step.end_line = first_line + last_code as u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Opens on anything that looks like a statement.
    struct AnyStatement;

    impl BraceRules for AnyStatement {
        fn name(&self) -> &'static str {
            "any"
        }

        fn opens_step(&self, trimmed: &str) -> bool {
            trimmed.starts_with(|c: char| c.is_alphabetic())
        }

        fn title(&self, trimmed: &str) -> String {
            trimmed.to_string()
        }
    }

    fn segment(src: &str) -> Vec<GeneratedStep> {
        let lines: Vec<&str> = src.lines().collect();
        BraceScanner(AnyStatement).segment(&lines, 1)
    }

    #[test]
    fn test_brace_delta() {
        assert_eq!(brace_delta("if (a) {"), 1);
        assert_eq!(brace_delta("} else {"), 0);
        assert_eq!(brace_delta("}});"), -2);
    }

    #[test]
    fn test_semicolon_inside_block_does_not_close() {
        let steps = segment("if (a) {\n  b();\n  c();\n}\nd();");
        assert_eq!(steps.len(), 2);
        assert_eq!((steps[0].start_line, steps[0].end_line), (1, 4));
        assert_eq!((steps[1].start_line, steps[1].end_line), (5, 5));
    }

    #[test]
    fn test_step_opened_at_depth_one_closes_on_semicolon() {
        // `{` alone never opens, so the statements inside open at depth 1
        let steps = segment("{\n  a();\n  b();\n}");
        assert_eq!(steps.len(), 2);
        assert_eq!((steps[0].start_line, steps[0].end_line), (2, 2));
        // the orphan closing brace is absorbed by the final step
        assert_eq!((steps[1].start_line, steps[1].end_line), (3, 4));
    }

    #[test]
    fn test_no_open_above_depth_one() {
        let steps = segment("{\n{\n  deep();\n}\n}");
        assert_eq!(steps.len(), 1);
        // nothing opened, so the whole code range becomes one step
        assert_eq!((steps[0].start_line, steps[0].end_line), (1, 5));
    }

    #[test]
    fn test_interior_comments_kept_trailing_dropped() {
        let steps = segment("run(\n  // note\n\n  x);\n// trailing\n\n");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].end_line, 4);
        assert_eq!(steps[0].code_snippet, "run(\n  // note\n\n  x);");
    }

    #[test]
    fn test_unclosed_step_recovered() {
        let steps = segment("call(a,\n  b,\n  c");
        assert_eq!(steps.len(), 1);
        assert_eq!((steps[0].start_line, steps[0].end_line), (1, 3));
    }

    #[test]
    fn test_leading_stray_close_brace_does_not_shift_depth() {
        let steps = segment("}\nif (a) {\n  return 1;\n}\nfoo();\nbar();");
        let ranges: Vec<(u32, u32)> = steps.iter().map(|s| (s.start_line, s.end_line)).collect();
        assert_eq!(ranges, vec![(2, 4), (5, 5), (6, 6)]);
    }

    #[test]
    fn test_only_comments_yield_nothing() {
        assert!(segment("// a\n\n   // b\n").is_empty());
        assert!(segment("").is_empty());
    }
}
