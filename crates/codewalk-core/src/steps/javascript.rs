//! JavaScript / TypeScript step heuristics.

use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::BraceRules;
use super::classify::{control_flow_title, leading_keyword};

const OPEN_KEYWORDS: &[&str] = &[
    "const", "let", "var", "function", "async", "if", "for", "while", "switch", "try", "return",
    "await",
];

const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "try", "return"];

/// `name(`: a bare identifier call.
static CALL_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+\s*\(").expect("Invalid call regex"));

/// `obj.member`: a dotted method call or property chain.
static METHOD_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+\.\w+").expect("Invalid method regex"));

static ARROW_BINDING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:\([^)]*\)|\w+)\s*=>")
        .expect("Invalid arrow binding regex")
});

static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:const|let|var)\s+(\w+)").expect("Invalid variable regex"));

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:async\s+)?function\s*\*?\s*(\w+)").expect("Invalid function regex")
});

static CALL_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:await\s+)?(\w+(?:\.\w+)*)\s*\(").expect("Invalid call title regex")
});

/// Rules for the `typescript` / `javascript` family.
pub(crate) struct JavaScriptRules;

impl BraceRules for JavaScriptRules {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn opens_step(&self, trimmed: &str) -> bool {
        leading_keyword(trimmed, OPEN_KEYWORDS).is_some()
            || CALL_START_RE.is_match(trimmed)
            || METHOD_START_RE.is_match(trimmed)
    }

    fn closes_on_trailing_comma(&self) -> bool {
        true
    }

    fn title(&self, trimmed: &str) -> String {
        if let Some(caps) = ARROW_BINDING_RE.captures(trimmed) {
            return format!("Define {}", &caps[1]);
        }
        if let Some(caps) = VARIABLE_RE.captures(trimmed) {
            return format!("Initialize {}", &caps[1]);
        }
        if let Some(caps) = FUNCTION_RE.captures(trimmed) {
            return format!("Define {}", &caps[1]);
        }
        if let Some(title) = leading_keyword(trimmed, CONTROL_KEYWORDS).and_then(control_flow_title) {
            return title.to_string();
        }
        if let Some(caps) = CALL_TITLE_RE.captures(trimmed) {
            return format!("Call {}", &caps[1]);
        }
        "Code block".to_string()
    }
}
