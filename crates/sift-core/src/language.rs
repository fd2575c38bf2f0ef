//! Language hints from file extensions

use std::path::Path;

/// Analyzer language hint for a path; `"text"` when unknown
#[must_use]
pub fn language_hint(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("rs") => "rust",
        Some("py" | "pyi") => "python",
        Some("ts" | "tsx" | "mts" | "cts") => "typescript",
        Some("js" | "jsx" | "mjs" | "cjs") => "javascript",
        Some("go") => "go",
        Some("java") => "java",
        Some("kt" | "kts") => "kotlin",
        Some("swift") => "swift",
        Some("rb") => "ruby",
        Some("php") => "php",
        Some("c" | "h") => "c",
        Some("cc" | "cpp" | "cxx" | "hpp" | "hh") => "cpp",
        Some("cs") => "csharp",
        Some("scala") => "scala",
        Some("sh" | "bash") => "shell",
        Some("sql") => "sql",
        Some("vue") => "vue",
        _ => "text",
    }
}
