//! Heuristic segmentation of source text into walkthrough steps.
//!
//! Each language family is a named strategy looked up by language tag.
//! Brace languages share one depth-tracking scanner parameterised by
//! per-language start patterns and titles; every other tag falls back to
//! blank-line segmentation. The raw steps then go through a consolidation
//! pass that bounds their number.

mod blank_line;
mod brace;
mod classify;
mod consolidate;
mod csharp;
mod javascript;

pub use consolidate::consolidate_steps;

use codewalk_types::GeneratedStep;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

use crate::language::comment_prefix;
use blank_line::BlankLineStrategy;
use brace::BraceScanner;
use csharp::CSharpRules;
use javascript::JavaScriptRules;

/// Segmentation contract shared by every language strategy.
pub(crate) trait SegmentationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Split `lines` into raw steps; `first_line` is the file line of `lines[0]`.
    fn segment(&self, lines: &[&str], first_line: u32) -> Vec<GeneratedStep>;
}

static JAVASCRIPT: BraceScanner<JavaScriptRules> = BraceScanner(JavaScriptRules);
static CSHARP: BraceScanner<CSharpRules> = BraceScanner(CSharpRules);

static STRATEGIES: Lazy<HashMap<&'static str, &'static dyn SegmentationStrategy>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, &'static dyn SegmentationStrategy> = HashMap::new();
    for tag in ["typescript", "javascript", "typescriptreact", "javascriptreact"] {
        map.insert(tag, &JAVASCRIPT);
    }
    map.insert("csharp", &CSHARP);
    map
});

/// Converts raw source text into an ordered list of steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepGenerator;

impl StepGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Segment `source` into steps.
    ///
    /// `first_line` is the 1-based file line of the first line of `source`,
    /// so step line numbers land in the original file's coordinate space.
    /// Empty or comment-only input yields no steps.
    pub fn generate(&self, source: &str, language: &str, first_line: u32) -> Vec<GeneratedStep> {
        let lines: Vec<&str> = source.lines().collect();

        let raw = match STRATEGIES.get(language) {
            Some(strategy) => {
                debug!(
                    target: "codewalk::steps",
                    "Segmenting {} lines of {} with {} strategy",
                    lines.len(),
                    language,
                    strategy.name()
                );
                strategy.segment(&lines, first_line)
            }
            None => {
                let fallback = BlankLineStrategy::new(comment_prefix(language));
                debug!(
                    target: "codewalk::steps",
                    "No heuristic for {}, segmenting {} lines with {} strategy",
                    language,
                    lines.len(),
                    fallback.name()
                );
                fallback.segment(&lines, first_line)
            }
        };

        let raw_count = raw.len();
        let steps = consolidate_steps(raw);
        debug!(
            target: "codewalk::steps",
            "Generated {} steps ({} before consolidation)",
            steps.len(),
            raw_count
        );
        steps
    }

    /// Whether `language` has a dedicated heuristic.
    pub fn has_heuristic(language: &str) -> bool {
        STRATEGIES.contains_key(language)
    }
}
