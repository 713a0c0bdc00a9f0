//! Editor selection captured when a walkthrough starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A 1-based line/column range inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl SelectionRange {
    /// Range covering whole lines `start_line..=end_line`.
    pub fn lines(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line,
            start_column: 0,
            end_column: 0,
        }
    }
}

/// Source code selected by the user. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSelection {
    /// Absolute path of the source file.
    pub file_path: PathBuf,
    /// Display name (usually the file name without directories).
    pub file_name: String,
    pub range: SelectionRange,
    /// Raw selected text.
    pub content: String,
    /// Editor language identifier (e.g. "typescript", "csharp").
    pub language: String,
}
