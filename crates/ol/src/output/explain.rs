//! Explain command output formatting.

use outline_query::filter::Explanation;
use outline_query::NodeRef;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{format_outcome, truncate_str};
use super::matches::NodeOutput;

/// JSON output structure for the explain command.
#[derive(Serialize)]
pub struct ExplainOutput<'a> {
    pub query: &'a str,
    pub node: NodeOutput<'a>,
    pub matched: bool,
    pub explanation: &'a Explanation,
}

/// Formats an explanation as JSON.
pub fn format_explanation_json(
    query: &str,
    node: NodeRef<'_>,
    explanation: &Explanation,
) -> Result<String, serde_json::Error> {
    let output = ExplainOutput {
        query,
        node: NodeOutput::from_node(node),
        matched: explanation.matched,
        explanation,
    };
    serde_json::to_string_pretty(&output)
}

/// Formats an explanation as a verdict line followed by the annotated expression tree.
pub fn format_explanation_tree(
    node: NodeRef<'_>,
    explanation: &Explanation,
    use_colors: bool,
) -> String {
    let data = node.data();
    let verdict = if explanation.matched {
        "matches"
    } else {
        "does not match"
    };
    let subject = format!("{} ({})", truncate_str(&data.text, 60), data.id);

    let mut output = if use_colors {
        let verdict = if explanation.matched {
            verdict.green().bold().to_string()
        } else {
            verdict.red().bold().to_string()
        };
        format!("{} {}\n\n", subject.bold(), verdict)
    } else {
        format!("{subject} {verdict}\n\n")
    };

    push_explanation(&mut output, explanation, 0, use_colors);
    output
}

fn push_explanation(output: &mut String, explanation: &Explanation, depth: usize, use_colors: bool) {
    let indent = "  ".repeat(depth);
    let mark = format_outcome(explanation.matched, use_colors);
    let reason = if use_colors {
        explanation.reason.dimmed().to_string()
    } else {
        explanation.reason.clone()
    };
    output.push_str(&format!(
        "{indent}{mark} {}  {reason}\n",
        explanation.expression
    ));

    for child in &explanation.children {
        push_explanation(output, child, depth + 1, use_colors);
    }
}
