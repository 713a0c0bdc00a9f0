//! C# step heuristics.

use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::BraceRules;
use super::classify::{control_flow_title, leading_keyword};

const OPEN_KEYWORDS: &[&str] = &[
    "var", "int", "string", "bool", "if", "for", "foreach", "while", "switch", "try", "return",
    "await", "using",
];

const CONTROL_KEYWORDS: &[&str] = &["if", "foreach", "for", "while", "switch", "try", "return", "using"];

/// `Type name =`, excluding `==` and `=>`.
static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w<>\[\]?,.]+\s+(\w+)\s*=(?:[^=>]|$)").expect("Invalid declaration regex")
});

static CALL_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+\s*\(").expect("Invalid call regex"));

static CALL_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:await\s+)?(\w+(?:\.\w+)*)\s*\(").expect("Invalid call title regex")
});

/// Rules for `csharp`.
pub(crate) struct CSharpRules;

impl BraceRules for CSharpRules {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn opens_step(&self, trimmed: &str) -> bool {
        leading_keyword(trimmed, OPEN_KEYWORDS).is_some()
            || DECLARATION_RE.is_match(trimmed)
            || CALL_START_RE.is_match(trimmed)
    }

    fn title(&self, trimmed: &str) -> String {
        if let Some(title) = leading_keyword(trimmed, CONTROL_KEYWORDS).and_then(control_flow_title) {
            return title.to_string();
        }
        if let Some(caps) = DECLARATION_RE.captures(trimmed) {
            return format!("Initialize {}", &caps[1]);
        }
        if let Some(caps) = CALL_TITLE_RE.captures(trimmed) {
            return format!("Call {}", &caps[1]);
        }
        "Code block".to_string()
    }
}
