//! Abstract Syntax Tree (AST) for query expressions.

use std::fmt;

use serde::Serialize;

use super::dates::DateValue;

/// Comparison operator of a filter criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl ComparisonOp {
    /// Operators in longest-match-first order, as recognized in criteria.
    pub(crate) const PREFIXES: [(&'static str, ComparisonOp); 6] = [
        ("!=", ComparisonOp::NotEqual),
        (">=", ComparisonOp::GreaterEqual),
        ("<=", ComparisonOp::LessEqual),
        (">", ComparisonOp::Greater),
        ("<", ComparisonOp::Less),
        ("=", ComparisonOp::Equal),
    ];

    /// The operator as written in a query.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEqual => ">=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEqual => "<=",
        }
    }

    /// Compares `actual` (the node's value) against `expected` (the query's).
    pub fn compare<T: Ord + ?Sized>(self, actual: &T, expected: &T) -> bool {
        match self {
            ComparisonOp::Equal => actual == expected,
            ComparisonOp::NotEqual => actual != expected,
            ComparisonOp::Greater => actual > expected,
            ComparisonOp::GreaterEqual => actual >= expected,
            ComparisonOp::Less => actual < expected,
            ComparisonOp::LessEqual => actual <= expected,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What an attribute filter tests.
///
/// Whether a value is a date is decided once, when the query is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeTest {
    /// The key is present with a non-empty value (`@key`).
    Exists,
    /// Ordinal string comparison (`@status=done`).
    Text(ComparisonOp, String),
    /// Calendar date comparison (`@due<-7d`).
    Date(ComparisonOp, DateValue),
}

/// Represents a parsed query expression.
///
/// Each variant is a predicate over a single node or a boolean combination of
/// predicates. Expressions are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches every node. Result of an empty query.
    AlwaysMatch,

    // ==================== Node Predicates ====================
    /// Case-insensitive substring of the node text.
    Text(String),

    /// Distance from the root (roots have depth 0).
    Depth(ComparisonOp, usize),

    /// Number of direct children.
    Children(ComparisonOp, usize),

    /// Attribute existence, string or date comparison.
    Attribute {
        /// Attribute key.
        key: String,
        /// The test applied to the stored value.
        test: AttributeTest,
    },

    /// Creation date comparison.
    CreatedDate(ComparisonOp, DateValue),

    /// Modification date comparison.
    ModifiedDate(ComparisonOp, DateValue),

    /// Tag membership (case-insensitive).
    Tag(String),

    /// Node text contains a `[[id]]` or `[[id|label]]` link to the target.
    Reference(String),

    // ==================== Structural ====================
    /// The immediate parent matches the inner expression.
    Parent(Box<Filter>),

    /// Some ancestor matches the inner expression.
    Ancestor(Box<Filter>),

    // ==================== Boolean Operators ====================
    /// Logical AND of two filters.
    And(Box<Filter>, Box<Filter>),

    /// Logical OR of two filters.
    Or(Box<Filter>, Box<Filter>),

    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Creates an AND filter from two filters.
    ///
    /// # Example
    ///
    /// ```
    /// use outline_query::filter::Filter;
    ///
    /// let filter = Filter::and(Filter::text("task"), Filter::text("project"));
    /// assert!(matches!(filter, Filter::And(_, _)));
    /// ```
    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR filter from two filters.
    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or(Box::new(left), Box::new(right))
    }

    /// Creates a NOT filter from another filter.
    pub fn negate(inner: Filter) -> Self {
        Filter::Not(Box::new(inner))
    }

    /// Creates a text filter.
    pub fn text(fragment: impl Into<String>) -> Self {
        Filter::Text(fragment.into())
    }

    /// Creates a parent filter.
    pub fn parent(inner: Filter) -> Self {
        Filter::Parent(Box::new(inner))
    }

    /// Creates an ancestor filter.
    pub fn ancestor(inner: Filter) -> Self {
        Filter::Ancestor(Box::new(inner))
    }

    /// Creates an attribute string comparison.
    pub fn attribute(key: impl Into<String>, op: ComparisonOp, value: impl Into<String>) -> Self {
        Filter::Attribute {
            key: key.into(),
            test: AttributeTest::Text(op, value.into()),
        }
    }

    /// Creates an attribute existence test.
    pub fn has_attribute(key: impl Into<String>) -> Self {
        Filter::Attribute {
            key: key.into(),
            test: AttributeTest::Exists,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Filter::Or(_, _) => 0,
            Filter::And(_, _) => 1,
            _ => 2,
        }
    }

    fn fmt_with_precedence(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let grouped = self.precedence() < min;
        if grouped {
            f.write_str("(")?;
        }

        match self {
            Filter::AlwaysMatch => f.write_str("\"\"")?,
            Filter::Text(fragment) => write_value(f, fragment)?,
            Filter::Depth(op, value) => write!(f, "d:{}{value}", criteria_op(*op))?,
            Filter::Children(op, value) => write!(f, "children:{}{value}", criteria_op(*op))?,
            Filter::Attribute { key, test } => {
                write!(f, "@{key}")?;
                match test {
                    AttributeTest::Exists => {}
                    AttributeTest::Text(op, value) => {
                        f.write_str(op.symbol())?;
                        // Quoting keeps date-like strings from being read back as dates.
                        if DateValue::parse(value).is_some() {
                            write!(f, "\"{value}\"")?;
                        } else {
                            write_value(f, value)?;
                        }
                    }
                    AttributeTest::Date(op, value) => write!(f, "{op}{value}")?,
                }
            }
            Filter::CreatedDate(op, value) => write!(f, "c:{}{value}", criteria_op(*op))?,
            Filter::ModifiedDate(op, value) => write!(f, "m:{}{value}", criteria_op(*op))?,
            Filter::Tag(tag) => {
                f.write_str("tag:")?;
                // The parser strips one leading `#`.
                if tag.starts_with('#') {
                    write_value(f, &format!("#{tag}"))?;
                } else {
                    write_value(f, tag)?;
                }
            }
            Filter::Reference(target) => {
                f.write_str("ref:")?;
                // Likewise one pair of `[[...]]`.
                if target.starts_with("[[") && target.ends_with("]]") {
                    write_value(f, &format!("[[{target}]]"))?;
                } else {
                    write_value(f, target)?;
                }
            }
            Filter::Parent(inner) => write!(f, "p:({inner})")?,
            Filter::Ancestor(inner) => write!(f, "a:({inner})")?,
            Filter::And(left, right) => {
                left.fmt_with_precedence(f, 1)?;
                f.write_str(" ")?;
                right.fmt_with_precedence(f, 2)?;
            }
            Filter::Or(left, right) => {
                left.fmt_with_precedence(f, 0)?;
                f.write_str(" | ")?;
                right.fmt_with_precedence(f, 1)?;
            }
            Filter::Not(inner) => {
                f.write_str("-")?;
                inner.fmt_with_precedence(f, 2)?;
            }
        }

        if grouped {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Equality is the default operator of named filters and is left implicit.
fn criteria_op(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Equal => "",
        other => other.symbol(),
    }
}

/// Writes a word as-is when the lexer would read it back unchanged, quoted
/// otherwise.
fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let plain = !value.is_empty() && value.chars().all(is_plain_char);
    if plain || value.contains('"') {
        f.write_str(value)
    } else {
        write!(f, "\"{value}\"")
    }
}

fn is_plain_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '_' | '.' | ',' | '\'' | '/' | '#' | '&' | '*' | '?' | '%' | '$' | '~'
        )
}

/// Prints the expression as a query string.
///
/// Parsing the printed string yields an expression with the same match
/// behavior.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_precedence(f, 0)
    }
}
