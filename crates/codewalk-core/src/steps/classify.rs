//! Surface-text heuristics shared by the language strategies.

use codewalk_types::StepType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Async markers, network calls, persistence verbs and explicit returns.
static CRITICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bawait\b|\bfetch\s*\(|\.\w+Async\s*\(|\.(?:save|create|update|delete)|\breturn\b")
        .expect("Invalid critical marker regex")
});

/// Branching/looping keywords and spaced assignments.
static SUPPORTING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:if|else|for|foreach|while|do|switch)\b| = ").expect("Invalid supporting marker regex")
});

/// Classify a single trimmed line.
pub(crate) fn classify_line(trimmed: &str) -> StepType {
    if CRITICAL_RE.is_match(trimmed) {
        StepType::Critical
    } else if SUPPORTING_RE.is_match(trimmed) {
        StepType::Supporting
    } else {
        StepType::Detail
    }
}

/// Highest tier over every non-skipped line.
pub(crate) fn classify_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> StepType {
    lines
        .into_iter()
        .map(str::trim)
        .filter(|t| !is_skipped(t))
        .map(classify_line)
        .max()
        .unwrap_or(StepType::Detail)
}

/// Blank and line-comment-only lines never open or close a step.
pub(crate) fn is_skipped(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with("//")
}

/// `true` when `line` starts with `keyword` as a whole word.
pub(crate) fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    match line.strip_prefix(keyword) {
        Some(rest) => !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

/// First keyword from `keywords` that `line` starts with.
pub(crate) fn leading_keyword<'k>(line: &str, keywords: &[&'k str]) -> Option<&'k str> {
    keywords.iter().copied().find(|kw| starts_with_keyword(line, kw))
}

/// Title for control-flow openers common to brace languages.
pub(crate) fn control_flow_title(keyword: &str) -> Option<&'static str> {
    let title = match keyword {
        "if" => "Conditional check",
        "for" | "foreach" => "Loop iteration",
        "while" => "While loop",
        "switch" => "Switch statement",
        "try" => "Try block",
        "return" => "Return statement",
        "using" => "Using statement",
        _ => return None,
    };
    Some(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_markers() {
        assert_eq!(classify_line("const data = await load();"), StepType::Critical);
        assert_eq!(classify_line("fetch(url).then(r => r.json());"), StepType::Critical);
        assert_eq!(classify_line("var user = await repo.FindAsync(id);"), StepType::Critical);
        assert_eq!(classify_line("db.users.save(user);"), StepType::Critical);
        assert_eq!(classify_line("return total;"), StepType::Critical);
    }

    #[test]
    fn test_supporting_markers() {
        assert_eq!(classify_line("if (ready) {"), StepType::Supporting);
        assert_eq!(classify_line("for (const x of xs) {"), StepType::Supporting);
        assert_eq!(classify_line("let count = 0;"), StepType::Supporting);
    }

    #[test]
    fn test_detail_fallback() {
        assert_eq!(classify_line("console.log(x);"), StepType::Detail);
        assert_eq!(classify_line("i++;"), StepType::Detail);
        // `returned` is not the `return` keyword
        assert_eq!(classify_line("markReturned(order);"), StepType::Detail);
    }

    #[test]
    fn test_classify_lines_takes_highest_tier() {
        let lines = ["if (x > y) {", "  return x;", "}"];
        assert_eq!(classify_lines(lines), StepType::Critical);
        assert_eq!(classify_lines(["// return early", "log(x);"]), StepType::Detail);
        assert_eq!(classify_lines(Vec::<&str>::new()), StepType::Detail);
    }

    #[test]
    fn test_starts_with_keyword() {
        assert!(starts_with_keyword("if (x)", "if"));
        assert!(starts_with_keyword("if(x)", "if"));
        assert!(starts_with_keyword("try", "try"));
        assert!(!starts_with_keyword("ifReady()", "if"));
        assert!(!starts_with_keyword("forEach(x)", "for"));
        assert_eq!(leading_keyword("while (a)", &["if", "while"]), Some("while"));
    }
}
