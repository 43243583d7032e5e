//! Query language for hierarchical outlines.
//!
//! This crate parses search queries such as `@status=done -children:0` or
//! `a:(@type=project) d:>1` into an expression tree and evaluates them against
//! the nodes of an [`Outline`]. It also provides JSON storage for outlines and
//! saved searches whose results act as virtual children.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use outline_query::filter::{parse_query, find_matches};
//! use outline_query::{NodeData, Outline, OutlineNode};
//!
//! let mut outline = Outline::new();
//! let project = outline.add_root(NodeData::new("p", "Launch")).unwrap();
//! outline
//!     .add_child(project, NodeData::new("t", "Draft press release"))
//!     .unwrap();
//!
//! let filter = parse_query("p:launch press").unwrap();
//! let found = find_matches(&filter, outline.roots(), Utc::now());
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].id(), "t");
//! ```

pub mod filter;
pub mod outline;
pub mod saved_search;
pub mod store;

pub use filter::{EvalContext, Explanation, Filter, FilterEvaluator, FilterParser, SyntaxError};
pub use outline::{NodeData, NodeId, NodeRef, Outline, OutlineError, OutlineNode};
pub use saved_search::{saved_searches, SavedSearch, SEARCH_ATTRIBUTE};
pub use store::{NodeRecord, OutlineDocument, OutlineStore, StoreError};
