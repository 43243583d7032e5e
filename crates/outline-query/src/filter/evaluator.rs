//! Filter evaluation against outline nodes.
//!
//! This module provides the [`FilterEvaluator`] for evaluating parsed query
//! expressions against the nodes of an outline.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use outline_query::filter::{EvalContext, FilterEvaluator, FilterParser};
//! use outline_query::{NodeData, Outline, OutlineNode};
//!
//! let mut outline = Outline::new();
//! let root = outline.add_root(NodeData::new("root", "Projects")).unwrap();
//! outline
//!     .add_child(root, NodeData::new("t1", "Write report").with_attribute("status", "todo"))
//!     .unwrap();
//!
//! let filter = FilterParser::parse("@status=todo d:1").unwrap();
//! let context = EvalContext::new(Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap());
//! let evaluator = FilterEvaluator::new(&filter, context);
//!
//! let matches = evaluator.find_matches(outline.roots());
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].id(), "t1");
//! ```

use std::time::Instant;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use tracing::trace;

use super::ast::{AttributeTest, ComparisonOp, Filter};
use super::dates::{parse_stored_date, DateValue};
use super::explain::{explain_with, Explanation};
use crate::outline::{OutlineNode, Preorder};

/// Ambient data for evaluation: the evaluation instant and the UTC offset that
/// defines calendar days.
///
/// Relative dates (`-7d`) are resolved against `now` at evaluation time, not
/// when the query was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl EvalContext {
    /// Creates a context for the instant `now`, with calendar days in UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }

    /// Creates a context for the current wall-clock time.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Uses `offset` to derive calendar days from timestamps.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// The evaluation instant.
    pub fn instant(&self) -> DateTime<Utc> {
        self.now
    }

    /// The offset used for calendar days.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day of the evaluation instant.
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now)
    }

    /// The calendar day of `timestamp`.
    pub fn local_date(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&self.offset).date_naive()
    }
}

impl Filter {
    /// Returns true if `node` matches this expression.
    ///
    /// Evaluation is pure: it reads the node and its ancestors and never
    /// depends on other nodes having been evaluated.
    pub fn matches<N: OutlineNode>(&self, node: N, context: &EvalContext) -> bool {
        match self {
            Filter::AlwaysMatch => true,

            Filter::Text(fragment) => contains_ignore_case(node.text(), fragment),

            Filter::Depth(op, value) => op.compare(&node.depth(), value),

            Filter::Children(op, value) => op.compare(&node.child_count(), value),

            Filter::Attribute { key, test } => attribute_matches(node, key, test, context),

            Filter::CreatedDate(op, value) => {
                date_matches(*op, context.local_date(node.created_at()), value, context)
            }

            Filter::ModifiedDate(op, value) => {
                date_matches(*op, context.local_date(node.modified_at()), value, context)
            }

            Filter::Tag(tag) => node.has_tag(tag),

            Filter::Reference(target) => contains_reference(node.text(), target),

            Filter::Parent(inner) => node
                .parent()
                .is_some_and(|parent| inner.matches(parent, context)),

            Filter::Ancestor(inner) => node
                .ancestors()
                .any(|ancestor| inner.matches(ancestor, context)),

            Filter::And(left, right) => left.matches(node, context) && right.matches(node, context),

            Filter::Or(left, right) => left.matches(node, context) || right.matches(node, context),

            Filter::Not(inner) => !inner.matches(node, context),
        }
    }
}

/// Case-insensitive substring test. An empty fragment matches everything.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn attribute_matches<N: OutlineNode>(
    node: N,
    key: &str,
    test: &AttributeTest,
    context: &EvalContext,
) -> bool {
    let Some(stored) = node.attribute(key) else {
        return false;
    };

    match test {
        AttributeTest::Exists => !stored.is_empty(),
        AttributeTest::Text(op, expected) => op.compare(stored, expected.as_str()),
        AttributeTest::Date(op, expected) => parse_stored_date(stored, &context.offset())
            .is_some_and(|actual| date_matches(*op, actual, expected, context)),
    }
}

pub(crate) fn date_matches(
    op: ComparisonOp,
    actual: NaiveDate,
    expected: &DateValue,
    context: &EvalContext,
) -> bool {
    expected
        .resolve(context.today())
        .is_some_and(|target| op.compare(&actual, &target))
}

/// Returns true if `text` contains a `[[target]]` or `[[target|label]]` link.
///
/// Only an exact identifier inside double brackets counts; the bare identifier
/// elsewhere in the text, or a longer identifier that starts with it, does not.
pub fn contains_reference(text: &str, target: &str) -> bool {
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("]]") else {
            return false;
        };
        let inner = &after[..end];
        // A stray `[[` before the link: the link starts at the last opener.
        let inner = inner.rfind("[[").map_or(inner, |i| &inner[i + 2..]);
        let id = inner.split_once('|').map_or(inner, |(id, _)| id);
        if id == target {
            return true;
        }
        rest = &after[end + 2..];
    }
    false
}

/// Evaluates a parsed filter against nodes.
///
/// The evaluator borrows a parsed [`Filter`] and carries the [`EvalContext`]
/// for one evaluation pass.
#[derive(Debug)]
pub struct FilterEvaluator<'a> {
    filter: &'a Filter,
    context: EvalContext,
}

impl<'a> FilterEvaluator<'a> {
    /// Creates a new filter evaluator.
    pub fn new(filter: &'a Filter, context: EvalContext) -> Self {
        Self { filter, context }
    }

    /// The evaluation context.
    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Returns true if the node matches the filter.
    pub fn matches<N: OutlineNode>(&self, node: N) -> bool {
        self.filter.matches(node, &self.context)
    }

    /// Returns every matching node of the forest in document order.
    ///
    /// Every node is tested on its own; a non-matching parent does not hide
    /// matching children.
    pub fn find_matches<N: OutlineNode>(&self, roots: impl IntoIterator<Item = N>) -> Vec<N> {
        let started = Instant::now();
        let matches: Vec<N> = Preorder::new(roots).filter(|node| self.matches(*node)).collect();
        trace!(
            filter = %self.filter,
            matches = matches.len(),
            elapsed = ?started.elapsed(),
            "evaluated filter"
        );
        matches
    }

    /// Returns the first `limit` matches in document order.
    ///
    /// The result is always a prefix of [`find_matches`](Self::find_matches).
    pub fn find_matches_limited<N: OutlineNode>(
        &self,
        roots: impl IntoIterator<Item = N>,
        limit: usize,
    ) -> Vec<N> {
        Preorder::new(roots)
            .filter(|node| self.matches(*node))
            .take(limit)
            .collect()
    }

    /// Explains how `node` evaluates, sub-expression by sub-expression.
    pub fn explain<N: OutlineNode>(&self, node: N) -> Explanation {
        explain_with(self.filter, node, &self.context)
    }

    /// Counts matching nodes.
    pub fn count_matches<N: OutlineNode>(&self, roots: impl IntoIterator<Item = N>) -> usize {
        Preorder::new(roots).filter(|node| self.matches(*node)).count()
    }
}

/// Returns true if `node` matches `filter` at the instant `now`.
pub fn matches<N: OutlineNode>(filter: &Filter, node: N, now: DateTime<Utc>) -> bool {
    filter.matches(node, &EvalContext::new(now))
}

/// Returns every node of the forest matching `filter` at `now`, in document
/// order.
pub fn find_matches<N: OutlineNode>(
    filter: &Filter,
    roots: impl IntoIterator<Item = N>,
    now: DateTime<Utc>,
) -> Vec<N> {
    FilterEvaluator::new(filter, EvalContext::new(now)).find_matches(roots)
}
