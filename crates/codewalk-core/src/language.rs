//! Language tag helpers.

use std::path::Path;

/// Guess the editor language tag from a file extension.
pub fn language_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let tag = match ext.as_str() {
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "cs" => "csharp",
        "py" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "rb" => "ruby",
        "sh" | "bash" => "shellscript",
        "" => "plaintext",
        other => other,
    };
    tag.to_string()
}

/// Human-readable name for a language tag.
pub fn display_name(language: &str) -> &str {
    match language {
        "typescript" => "TypeScript",
        "typescriptreact" => "TypeScript React",
        "javascript" => "JavaScript",
        "javascriptreact" => "JavaScript React",
        "csharp" => "C#",
        "python" => "Python",
        "java" => "Java",
        "go" => "Go",
        "rust" => "Rust",
        "cpp" => "C++",
        "c" => "C",
        other => other,
    }
}

/// Line-comment token used when annotating code for a language.
pub fn comment_prefix(language: &str) -> &'static str {
    match language {
        "python" | "ruby" | "shellscript" | "perl" | "r" | "yaml" | "toml" | "powershell" => "#",
        "sql" | "lua" | "haskell" => "--",
        _ => "//",
    }
}
