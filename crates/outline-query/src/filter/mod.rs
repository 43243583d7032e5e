//! Query language parser and evaluator for outline nodes.
//!
//! A query is parsed once into an immutable [`Filter`] and then evaluated
//! against each node of an outline. Evaluation is pure; relative dates are
//! resolved against the [`EvalContext`] supplied at evaluation time.
//!
//! # Supported Syntax
//!
//! ## Text
//! - `word` - Case-insensitive substring of the node text
//! - `"two words"` - Quoted phrase, taken verbatim
//!
//! ## Attributes
//! - `@key` - Attribute is present and non-empty
//! - `@key=value`, `@key!=value`, `@key<value`, ... - String comparison
//! - `@due<-7d`, `@due>=2025-01-01` - Date comparison when the value is a date
//!
//! ## Named Filters
//! - `d:2`, `d:>1` - Depth (roots are 0)
//! - `children:0`, `children:>2` - Number of direct children
//! - `c:>-7d`, `m:<=2025-01-01` - Created / modified date
//! - `p:(criteria)` - Immediate parent matches
//! - `a:(criteria)` - Some ancestor matches
//! - `ref:id`, `ref:[[id]]` - Text links `[[id]]`
//! - `tag:name`, `tag:#name` - Node carries the tag
//!
//! Unknown filter names (`http:`) are matched as plain text.
//!
//! ## Dates
//! - `YYYY-MM-DD`
//! - `today`, `yesterday`, `tomorrow`
//! - `[+|-]N(d|w|m|y)` - Offset from today; no sign means the past
//!
//! ## Boolean Operators
//! - whitespace or `+` - AND
//! - `|` - OR
//! - `-` - NOT
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use outline_query::filter::{parse_query, Filter};
//!
//! let filter = parse_query("-done (report | slides)").unwrap();
//! assert!(matches!(filter, Filter::And(_, _)));
//!
//! let err = parse_query("d:>").unwrap_err();
//! assert_eq!(err.fragment(), "d:>");
//! ```

mod ast;
mod dates;
mod error;
mod evaluator;
mod explain;
mod lexer;
mod parser;

pub use ast::{AttributeTest, ComparisonOp, Filter};
pub use dates::{parse_stored_date, DateUnit, DateValue, RelativeOffset};
pub use error::{FilterResult, SyntaxError};
pub use evaluator::{contains_reference, find_matches, matches, EvalContext, FilterEvaluator};
pub use explain::{explain, explain_with, Explanation};
pub use lexer::{tokenize, Lexer, PositionedToken, Token};
pub use parser::{suggest_filter_name, FilterParser};

/// Parses a query string into a [`Filter`].
///
/// Shorthand for [`FilterParser::parse`].
pub fn parse_query(input: &str) -> FilterResult<Filter> {
    FilterParser::parse(input)
}
