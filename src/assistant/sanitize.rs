//! Cleanup of raw assistant text before it is relayed.
//!
//! Assistants output arrives with retrieval citation markers, mixed bullet
//! glyphs, and headers glued to the preceding paragraph. [`tidy_reply`]
//! normalizes all of that so the splitter and the PDF section scraper see
//! blank-line separated paragraphs.

use std::sync::LazyLock;

use regex::Regex;

/// Retrieval citations such as `【4:0†source】`.
static CITATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"【[^】]*】").ok());

/// Leading bullet glyphs that get reflowed to `- `.
static BULLET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\s*)(?:[•●▪◦–]|\*(?:\s))\s*").ok());

/// Tidy a raw assistant reply.
///
/// - strips citation markers
/// - normalizes line endings and trailing whitespace
/// - rewrites `•`, `●`, `▪`, `◦`, `–` and `* ` bullets as `- `
/// - puts a blank line before every markdown header
/// - collapses runs of blank lines to one
pub fn tidy_reply(raw: &str) -> String {
    let without_citations = match CITATION.as_ref() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.to_owned(),
    };
    let normalized = without_citations.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    for line in normalized.lines() {
        let line = reflow_bullet(line.trim_end());
        let is_header = line.trim_start().starts_with('#');
        if is_header && lines.last().is_some_and(|prev| !prev.is_empty()) {
            lines.push(String::new());
        }
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    lines.join("\n").trim().to_owned()
}

fn reflow_bullet(line: &str) -> String {
    let Some(re) = BULLET.as_ref() else {
        return line.to_owned();
    };
    // Bold markers (`**text**`) start with `*` but are not bullets.
    if line.trim_start().starts_with("**") {
        return line.to_owned();
    }
    re.replace(line, "${1}- ").into_owned()
}
