//! Common helper functions for output formatting.

use std::collections::BTreeSet;

use outline_query::filter::SyntaxError;
use owo_colors::OwoColorize;

/// Truncates an ID to 8 characters for display.
pub fn truncate_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Truncates a string to a maximum number of characters.
///
/// Counts characters rather than bytes so multi-byte text never splits.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Formats tags for display.
pub fn format_tags(tags: &BTreeSet<String>, max_len: usize) -> String {
    if tags.is_empty() {
        return String::new();
    }

    let formatted: Vec<String> = tags.iter().map(|t| format!("#{t}")).collect();
    truncate_str(&formatted.join(" "), max_len)
}

/// Formats a match / no match marker.
pub fn format_outcome(matched: bool, use_colors: bool) -> String {
    let mark = if matched { "+" } else { "-" };
    if !use_colors {
        mark.to_string()
    } else if matched {
        mark.green().to_string()
    } else {
        mark.red().to_string()
    }
}

/// Formats a syntax error with the query and a caret under the offending position.
///
/// ```text
/// Syntax error: missing comparison value in 'd:>'
///   d:> report
///   ^
/// ```
pub fn format_syntax_error(query: &str, error: &SyntaxError, use_colors: bool) -> String {
    // Positions are byte offsets; the caret column counts characters.
    let position = error.position().min(query.len());
    let column = query
        .char_indices()
        .take_while(|(i, _)| *i < position)
        .count();

    let message = format!("Syntax error: {error}");
    let caret = format!("{:column$}^", "");

    if use_colors {
        format!("{}\n  {}\n  {}\n", message.red(), query, caret.yellow())
    } else {
        format!("{message}\n  {query}\n  {caret}\n")
    }
}
