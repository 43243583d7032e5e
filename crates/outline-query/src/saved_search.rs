//! Saved searches: nodes whose children are the live results of a query.
//!
//! A node carrying a `search` attribute is a saved search. Its query is
//! re-evaluated on demand and the matches act as virtual children.

use tracing::debug;

use crate::filter::{EvalContext, Filter, FilterEvaluator, FilterParser, FilterResult};
use crate::outline::{NodeRef, Outline, OutlineNode};

/// Attribute that holds a saved search's query.
pub const SEARCH_ATTRIBUTE: &str = "search";

/// A node that stores a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSearch<'a> {
    node: NodeRef<'a>,
    query: &'a str,
}

impl<'a> SavedSearch<'a> {
    /// Returns the saved search stored on `node`, if it has a `search`
    /// attribute.
    pub fn from_node(node: NodeRef<'a>) -> Option<Self> {
        let query = node.attributes().get(SEARCH_ATTRIBUTE)?;
        Some(Self {
            node,
            query: query.as_str(),
        })
    }

    /// The node holding the search.
    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    /// The stored query string.
    pub fn query(&self) -> &'a str {
        self.query
    }

    /// Parses the stored query.
    ///
    /// # Errors
    ///
    /// Returns the parser's [`SyntaxError`](crate::filter::SyntaxError) if the
    /// stored query is malformed.
    pub fn filter(&self) -> FilterResult<Filter> {
        FilterParser::parse(self.query)
    }

    /// Evaluates the search over the whole outline.
    ///
    /// Returns the matches in document order, leaving out the search node and
    /// its own subtree.
    ///
    /// # Errors
    ///
    /// Returns the parser's error if the stored query is malformed.
    pub fn materialize(
        &self,
        outline: &'a Outline,
        context: &EvalContext,
    ) -> FilterResult<Vec<NodeRef<'a>>> {
        let filter = self.filter()?;
        let evaluator = FilterEvaluator::new(&filter, *context);
        let matches: Vec<NodeRef<'a>> = outline
            .iter()
            .filter(|node| !node.is_within(self.node))
            .filter(|node| evaluator.matches(*node))
            .collect();

        debug!(
            search = self.node.id(),
            query = self.query,
            matches = matches.len(),
            "materialized saved search"
        );
        Ok(matches)
    }
}

/// Lists every saved search in the outline, in document order.
pub fn saved_searches(outline: &Outline) -> Vec<SavedSearch<'_>> {
    outline.iter().filter_map(SavedSearch::from_node).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::NodeData;
    use chrono::{TimeZone, Utc};

    fn context() -> EvalContext {
        EvalContext::new(Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap())
    }

    fn outline() -> Outline {
        let mut outline = Outline::new();
        let searches = outline
            .add_root(NodeData::new("searches", "Searches"))
            .unwrap();
        let open = outline
            .add_child(
                searches,
                NodeData::new("open", "Open tasks").with_attribute("search", "@status=todo"),
            )
            .unwrap();
        outline
            .add_child(
                open,
                NodeData::new("note", "pinned note").with_attribute("status", "todo"),
            )
            .unwrap();
        let work = outline.add_root(NodeData::new("work", "Work")).unwrap();
        outline
            .add_child(
                work,
                NodeData::new("t1", "Write report").with_attribute("status", "todo"),
            )
            .unwrap();
        outline
            .add_child(
                work,
                NodeData::new("t2", "Ship it").with_attribute("status", "done"),
            )
            .unwrap();
        outline
            .add_root(NodeData::new("broken", "Broken").with_attribute("search", "d:>"))
            .unwrap();
        outline
    }

    #[test]
    fn test_saved_searches_in_document_order() {
        let outline = outline();
        let found: Vec<_> = saved_searches(&outline)
            .iter()
            .map(|s| s.node().id().to_string())
            .collect();
        assert_eq!(found, ["open", "broken"]);
    }

    #[test]
    fn test_from_node_requires_search_attribute() {
        let outline = outline();
        assert!(SavedSearch::from_node(outline.find_by_id("work").unwrap()).is_none());
        let open = SavedSearch::from_node(outline.find_by_id("open").unwrap()).unwrap();
        assert_eq!(open.query(), "@status=todo");
    }

    #[test]
    fn test_materialize_excludes_own_subtree() {
        let outline = outline();
        let open = SavedSearch::from_node(outline.find_by_id("open").unwrap()).unwrap();
        let ids: Vec<_> = open
            .materialize(&outline, &context())
            .unwrap()
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        assert_eq!(ids, ["t1"]);
    }

    #[test]
    fn test_materialize_reports_syntax_error() {
        let outline = outline();
        let broken = SavedSearch::from_node(outline.find_by_id("broken").unwrap()).unwrap();
        let err = broken.materialize(&outline, &context()).unwrap_err();
        assert_eq!(err.fragment(), "d:>");
    }
}
