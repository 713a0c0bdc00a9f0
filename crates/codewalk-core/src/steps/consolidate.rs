//! Merge pass bounding the number of steps.

use codewalk_types::{GeneratedStep, StepType};

/// Above this count non-critical steps are merged.
const MAX_STEPS_BEFORE_MERGE: usize = 15;
/// Non-critical steps merged into one group at most.
const MERGE_GROUP_SIZE: usize = 3;

/// Merge runs of non-critical steps when there are too many.
///
/// Three or fewer steps are too few to merge, and counts up to 15 are
/// already in range, so both are returned unchanged. Critical steps always
/// stay standalone.
pub fn consolidate_steps(steps: Vec<GeneratedStep>) -> Vec<GeneratedStep> {
    if steps.len() <= MAX_STEPS_BEFORE_MERGE {
        return steps;
    }

    let mut consolidated = Vec::with_capacity(steps.len() / 2);
    let mut buffer: Vec<GeneratedStep> = Vec::with_capacity(MERGE_GROUP_SIZE);

    for step in steps {
        if step.step_type == StepType::Critical {
            if !buffer.is_empty() {
                consolidated.extend(merge_steps(std::mem::take(&mut buffer)));
            }
            consolidated.push(step);
        } else {
            buffer.push(step);
            if buffer.len() >= MERGE_GROUP_SIZE {
                consolidated.extend(merge_steps(std::mem::take(&mut buffer)));
            }
        }
    }

    consolidated.extend(merge_steps(buffer));

    consolidated
}

/// Collapse a group into one step spanning all of them.
fn merge_steps(group: Vec<GeneratedStep>) -> Option<GeneratedStep> {
    let merged_count = group.len();
    let step_type = if group.iter().any(|s| s.step_type == StepType::Critical) {
        StepType::Critical
    } else {
        StepType::Supporting
    };

    let mut iter = group.into_iter();
    let first = iter.next()?;

    let title = if merged_count > 1 {
        format!("{} (+ {} more)", first.title, merged_count - 1)
    } else {
        first.title
    };

    let mut merged = GeneratedStep {
        start_line: first.start_line,
        end_line: first.end_line,
        code_snippet: first.code_snippet,
        title,
        step_type,
    };
    for step in iter {
        merged.end_line = step.end_line;
        merged.code_snippet.push('\n');
        merged.code_snippet.push_str(&step.code_snippet);
    }
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(line: u32, step_type: StepType) -> GeneratedStep {
        GeneratedStep {
            start_line: line,
            end_line: line,
            code_snippet: format!("line{}();", line),
            title: format!("Step {}", line),
            step_type,
        }
    }

    fn steps(types: &[StepType]) -> Vec<GeneratedStep> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| step(i as u32 + 1, *t))
            .collect()
    }

    #[test]
    fn test_small_and_medium_counts_unchanged() {
        for n in [0, 1, 3, 4, 10, 15] {
            let input = steps(&vec![StepType::Detail; n]);
            assert_eq!(consolidate_steps(input.clone()), input, "n = {}", n);
        }
    }

    #[test]
    fn test_large_count_merges_in_threes() {
        let input = steps(&vec![StepType::Detail; 16]);
        let output = consolidate_steps(input);
        // 5 groups of 3 plus a trailing single
        assert_eq!(output.len(), 6);
        assert_eq!(output[0].title, "Step 1 (+ 2 more)");
        assert_eq!((output[0].start_line, output[0].end_line), (1, 3));
        assert_eq!(output[0].code_snippet, "line1();\nline2();\nline3();");
        assert_eq!(output[0].step_type, StepType::Supporting);
        // a lone leftover keeps its title
        assert_eq!(output[5].title, "Step 16");
        assert_eq!(output[5].step_type, StepType::Supporting);
    }

    #[test]
    fn test_critical_steps_flush_buffer_and_stay_standalone() {
        let mut types = vec![StepType::Supporting; 16];
        types[1] = StepType::Critical;
        types[9] = StepType::Critical;
        let input = steps(&types);
        let criticals: Vec<GeneratedStep> = input
            .iter()
            .filter(|s| s.step_type == StepType::Critical)
            .cloned()
            .collect();

        let output = consolidate_steps(input);

        assert_eq!(output[0].title, "Step 1");
        assert_eq!(output[1], criticals[0]);
        assert_eq!(output[2].title, "Step 3 (+ 2 more)");
        for critical in &criticals {
            assert!(output.contains(critical));
        }
        assert!(output.len() < 16);
    }
}
