//! Turning a file plus an optional line range into a [`CodeSelection`].

use anyhow::{bail, Context, Result};
use codewalk_core::language_for_path;
use codewalk_types::{CodeSelection, SelectionRange};
use std::path::Path;
use std::str::FromStr;

/// Inclusive 1-based line range given as `A:B` or a single line `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| format!("Invalid line number '{}'", v.trim()))
        };
        let (start, end) = match s.split_once(':') {
            Some((a, b)) => (parse(a)?, parse(b)?),
            None => {
                let line = parse(s)?;
                (line, line)
            }
        };
        if start == 0 || end < start {
            return Err(format!("Invalid line range '{}'. Use START:END with 1 <= START <= END.", s));
        }
        Ok(Self { start, end })
    }
}

/// Read `path` and select `lines` (the whole file when `None`).
///
/// The language tag comes from `language` or else the file extension.
pub fn load_selection(path: &Path, lines: Option<LineRange>, language: Option<&str>) -> Result<CodeSelection> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let all: Vec<&str> = text.lines().collect();
    let count = all.len() as u32;

    let range = match lines {
        Some(range) if range.start > count => {
            bail!("{} has {} lines, selection starts at line {}", path.display(), count, range.start)
        }
        Some(range) => LineRange {
            start: range.start,
            end: range.end.min(count),
        },
        None => LineRange {
            start: 1,
            end: count.max(1),
        },
    };

    let content = if count == 0 {
        String::new()
    } else {
        all[(range.start - 1) as usize..range.end as usize].join("\n")
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(CodeSelection {
        file_path: std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
        file_name,
        range: SelectionRange::lines(range.start, range.end),
        content,
        language: language.map_or_else(|| language_for_path(path), str::to_string),
    })
}
