//! Diagnostic traces: why a node did or did not match.
//!
//! [`explain`] labels every sub-expression with its outcome and a short reason.
//! The outcome of each label is the same boolean [`Filter::matches`] computes;
//! the only difference is that both operands of `And`/`Or` are always
//! explained, even when evaluation would have short-circuited.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::ast::{AttributeTest, ComparisonOp, Filter};
use super::dates::{parse_stored_date, DateValue};
use super::evaluator::{contains_ignore_case, contains_reference, date_matches, EvalContext};
use crate::outline::OutlineNode;

/// Outcome of one sub-expression for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    /// The sub-expression, printed as a query.
    pub expression: String,
    /// Whether it matched.
    pub matched: bool,
    /// Human-readable reason.
    pub reason: String,
    /// Explanations of operands or of the nodes a structural filter looked at.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Explanation>,
}

impl Explanation {
    fn leaf(filter: &Filter, matched: bool, reason: String) -> Self {
        Self {
            expression: filter.to_string(),
            matched,
            reason,
            children: Vec::new(),
        }
    }

    /// Renders the trace as an indented tree, one sub-expression per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, indent: usize) {
        let mark = if self.matched { "match" } else { "no match" };
        let _ = writeln!(
            out,
            "{:indent$}{} [{mark}] {}",
            "",
            self.expression,
            self.reason,
            indent = indent * 2
        );
        for child in &self.children {
            child.render_into(out, indent + 1);
        }
    }
}

/// Explains how `filter` evaluates against `node` at the instant `now`.
pub fn explain<N: OutlineNode>(filter: &Filter, node: N, now: DateTime<Utc>) -> Explanation {
    explain_with(filter, node, &EvalContext::new(now))
}

/// Explains how `filter` evaluates against `node` in `context`.
pub fn explain_with<N: OutlineNode>(
    filter: &Filter,
    node: N,
    context: &EvalContext,
) -> Explanation {
    match filter {
        Filter::AlwaysMatch => {
            Explanation::leaf(filter, true, "empty query matches every node".to_string())
        }

        Filter::Text(fragment) => {
            let matched = contains_ignore_case(node.text(), fragment);
            let reason = if matched {
                format!("text contains \"{fragment}\"")
            } else {
                format!("text does not contain \"{fragment}\"")
            };
            Explanation::leaf(filter, matched, reason)
        }

        Filter::Depth(op, value) => {
            let depth = node.depth();
            let matched = op.compare(&depth, value);
            let reason = format!("depth is {depth}, wanted {op} {value}");
            Explanation::leaf(filter, matched, reason)
        }

        Filter::Children(op, value) => {
            let count = node.child_count();
            let matched = op.compare(&count, value);
            let reason = format!("has {count} children, wanted {op} {value}");
            Explanation::leaf(filter, matched, reason)
        }

        Filter::Attribute { key, test } => explain_attribute(filter, node, key, test, context),

        Filter::CreatedDate(op, value) => {
            let actual = context.local_date(node.created_at());
            let matched = date_matches(*op, actual, value, context);
            let reason = describe_date("created", actual, *op, value, context);
            Explanation::leaf(filter, matched, reason)
        }

        Filter::ModifiedDate(op, value) => {
            let actual = context.local_date(node.modified_at());
            let matched = date_matches(*op, actual, value, context);
            let reason = describe_date("modified", actual, *op, value, context);
            Explanation::leaf(filter, matched, reason)
        }

        Filter::Tag(tag) => {
            let matched = node.has_tag(tag);
            let reason = if matched {
                format!("tagged \"{tag}\"")
            } else {
                format!("not tagged \"{tag}\"")
            };
            Explanation::leaf(filter, matched, reason)
        }

        Filter::Reference(target) => {
            let matched = contains_reference(node.text(), target);
            let reason = if matched {
                format!("text links [[{target}]]")
            } else {
                format!("text has no [[{target}]] link")
            };
            Explanation::leaf(filter, matched, reason)
        }

        Filter::Parent(inner) => match node.parent() {
            None => Explanation::leaf(filter, false, "node has no parent".to_string()),
            Some(parent) => {
                let child = explain_with(inner, parent, context);
                let reason = if child.matched {
                    format!("parent '{}' matches", parent.id())
                } else {
                    format!("parent '{}' does not match", parent.id())
                };
                Explanation {
                    expression: filter.to_string(),
                    matched: child.matched,
                    reason,
                    children: vec![child],
                }
            }
        },

        Filter::Ancestor(inner) => {
            let mut children = Vec::new();
            let mut found = None;
            for ancestor in node.ancestors() {
                let child = explain_with(inner, ancestor, context);
                let matched = child.matched;
                children.push(child);
                if matched {
                    found = Some(ancestor);
                    break;
                }
            }
            let reason = match found {
                Some(ancestor) => format!("ancestor '{}' matches", ancestor.id()),
                None if children.is_empty() => "node has no ancestors".to_string(),
                None => format!("none of {} ancestors match", children.len()),
            };
            Explanation {
                expression: filter.to_string(),
                matched: found.is_some(),
                reason,
                children,
            }
        }

        Filter::And(left, right) => {
            let left = explain_with(left, node, context);
            let right = explain_with(right, node, context);
            let matched = left.matched && right.matched;
            let reason = match (left.matched, right.matched) {
                (true, true) => "both operands match",
                (false, true) => "left operand does not match",
                (true, false) => "right operand does not match",
                (false, false) => "neither operand matches",
            };
            Explanation {
                expression: filter.to_string(),
                matched,
                reason: reason.to_string(),
                children: vec![left, right],
            }
        }

        Filter::Or(left, right) => {
            let left = explain_with(left, node, context);
            let right = explain_with(right, node, context);
            let matched = left.matched || right.matched;
            let reason = match (left.matched, right.matched) {
                (true, true) => "both operands match",
                (true, false) => "left operand matches",
                (false, true) => "right operand matches",
                (false, false) => "neither operand matches",
            };
            Explanation {
                expression: filter.to_string(),
                matched,
                reason: reason.to_string(),
                children: vec![left, right],
            }
        }

        Filter::Not(inner) => {
            let child = explain_with(inner, node, context);
            let matched = !child.matched;
            let reason = if matched {
                "negated expression does not match"
            } else {
                "negated expression matches"
            };
            Explanation {
                expression: filter.to_string(),
                matched,
                reason: reason.to_string(),
                children: vec![child],
            }
        }
    }
}

fn explain_attribute<N: OutlineNode>(
    filter: &Filter,
    node: N,
    key: &str,
    test: &AttributeTest,
    context: &EvalContext,
) -> Explanation {
    let Some(stored) = node.attribute(key) else {
        return Explanation::leaf(filter, false, format!("attribute '{key}' is missing"));
    };

    let (matched, reason) = match test {
        AttributeTest::Exists if stored.is_empty() => {
            (false, format!("attribute '{key}' is empty"))
        }
        AttributeTest::Exists => (true, format!("attribute '{key}' is set")),
        AttributeTest::Text(op, expected) => (
            op.compare(stored, expected.as_str()),
            format!("'{key}' is \"{stored}\", wanted {op} \"{expected}\""),
        ),
        AttributeTest::Date(op, expected) => match parse_stored_date(stored, &context.offset()) {
            None => (false, format!("'{key}' value \"{stored}\" is not a date")),
            Some(actual) => (
                date_matches(*op, actual, expected, context),
                describe_date(&format!("'{key}'"), actual, *op, expected, context),
            ),
        },
    };
    Explanation::leaf(filter, matched, reason)
}

fn describe_date(
    subject: &str,
    actual: NaiveDate,
    op: ComparisonOp,
    expected: &DateValue,
    context: &EvalContext,
) -> String {
    match expected.resolve(context.today()) {
        Some(target) => format!("{subject} {actual}, wanted {op} {target} ({expected})"),
        None => format!("{subject} {actual}, but {expected} is out of range"),
    }
}
