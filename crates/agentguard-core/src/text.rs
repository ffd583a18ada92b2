//! Text helpers

/// Normalize text before rule matching.
///
/// Lowercases the input and folds every run of whitespace (newlines and
/// tabs included) into a single space. Rules are written against lowercase,
/// single-spaced text.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate `text` to at most `max_chars` characters for logs and audit
/// records, appending `...` when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
