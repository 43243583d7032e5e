//! Recursive descent parser for query expressions.

use strsim::levenshtein;
use tracing::debug;

use super::ast::{AttributeTest, ComparisonOp, Filter};
use super::dates::DateValue;
use super::error::{FilterResult, SyntaxError};
use super::lexer::{Lexer, PositionedToken, Token};

/// Maximum nesting of groups, negations and nested filter criteria.
const MAX_NESTING: usize = 64;

/// Maximum number of atoms in one query, nested criteria included.
pub(super) const MAX_TERMS: usize = 512;

/// Maximum edit distance for suggesting a known filter name.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Filter names recognized before `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterName {
    Depth,
    Ancestor,
    Created,
    Modified,
    Children,
    Parent,
    Reference,
    Tag,
}

impl FilterName {
    const ALL: [(&'static str, FilterName); 8] = [
        ("d", FilterName::Depth),
        // `a:` means ancestor; attributes use the `@` prefix.
        ("a", FilterName::Ancestor),
        ("c", FilterName::Created),
        ("m", FilterName::Modified),
        ("children", FilterName::Children),
        ("p", FilterName::Parent),
        ("ref", FilterName::Reference),
        ("tag", FilterName::Tag),
    ];

    fn lookup(name: &str) -> Option<FilterName> {
        Self::ALL
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }
}

/// Returns the known filter name closest to `name`, if one is close enough to
/// be a likely typo.
pub fn suggest_filter_name(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    let (best, distance) = FilterName::ALL
        .iter()
        .map(|(known, _)| (*known, levenshtein(&lower, known)))
        .min_by_key(|(_, distance)| *distance)?;

    (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE && distance < lower.chars().count())
        .then_some(best)
}

/// Parser for query expressions.
///
/// # Grammar
///
/// ```text
/// query   ::= <empty> | or_expr
/// or_expr ::= and_expr ("|" and_expr)*
/// and_expr::= not_expr (["+"] not_expr)*     adjacent atoms are ANDed
/// not_expr::= "-" not_expr | atom
/// atom    ::= "(" or_expr ")" | text | filter
/// filter  ::= "@" key [op value] | name ":" criteria
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `-` (NOT) - unary, right-associative
/// 2. `+` or juxtaposition (AND) - binary, left-associative
/// 3. `|` (OR) - binary, left-associative
///
/// # Example
///
/// ```
/// use outline_query::filter::{Filter, FilterParser};
///
/// let filter = FilterParser::parse("a b | c").unwrap();
/// assert_eq!(
///     filter,
///     Filter::or(Filter::and(Filter::text("a"), Filter::text("b")), Filter::text("c"))
/// );
///
/// assert_eq!(FilterParser::parse("").unwrap(), Filter::AlwaysMatch);
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
    nesting: usize,
    terms: usize,
}

impl FilterParser {
    /// Parses a query string into a [`Filter`].
    ///
    /// An empty (or whitespace-only) query yields [`Filter::AlwaysMatch`].
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] carrying the offending fragment when the query
    /// has an unexpected token, an unclosed group, or a filter with a missing
    /// or malformed value. Queries nested deeper than 64 levels or with more
    /// than 512 atoms are rejected too.
    pub fn parse(input: &str) -> FilterResult<Filter> {
        Self::new(input, 0, 0, 0).parse_query()
    }

    fn new(input: &str, base: usize, nesting: usize, terms: usize) -> Self {
        Self {
            tokens: Lexer::with_base(input, base).tokenize(),
            position: 0,
            nesting,
            terms,
        }
    }

    fn parse_query(&mut self) -> FilterResult<Filter> {
        if self.check(&Token::EndOfInput) {
            return Ok(Filter::AlwaysMatch);
        }

        let filter = self.parse_or_expr()?;

        let trailing = self.current();
        if trailing.token != Token::EndOfInput {
            return Err(SyntaxError::unexpected_token(
                trailing.token.to_string(),
                trailing.position,
            ));
        }

        Ok(filter)
    }

    /// Returns the current token without consuming it.
    fn current(&self) -> &PositionedToken {
        // The stream always ends with EndOfInput and `advance` never moves past it.
        &self.tokens[self.position]
    }

    /// Consumes and returns the current token. `EndOfInput` is never consumed.
    fn advance(&mut self) -> PositionedToken {
        let token = self.current().clone();
        if token.token != Token::EndOfInput {
            self.position += 1;
        }
        token
    }

    fn previous_text(&self) -> String {
        self.position
            .checked_sub(1)
            .map(|i| self.tokens[i].token.to_string())
            .unwrap_or_default()
    }

    /// Checks if the current token matches the expected token type.
    fn check(&self, expected: &Token) -> bool {
        &self.current().token == expected
    }

    fn enter(&mut self, token: &Token, position: usize) -> FilterResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(SyntaxError::NestingTooDeep {
                token: token.to_string(),
                position,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Counts one atom. AND/OR chains grow one tree level per atom.
    fn count_term(&mut self, token: &Token, position: usize) -> FilterResult<()> {
        self.terms += 1;
        if self.terms > MAX_TERMS {
            return Err(SyntaxError::TooManyTerms {
                token: token.to_string(),
                position,
            });
        }
        Ok(())
    }

    /// Parses OR expressions: `and_expr ("|" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Filter> {
        let mut left = self.parse_and_expr()?;

        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Filter::or(left, right);
        }

        Ok(left)
    }

    /// Parses AND expressions, explicit (`+`) or implicit (adjacent atoms).
    fn parse_and_expr(&mut self) -> FilterResult<Filter> {
        let mut left = self.parse_not_expr()?;

        loop {
            if self.check(&Token::And) {
                self.advance();
            } else if !self.current().token.starts_atom() {
                break;
            }
            let right = self.parse_not_expr()?;
            left = Filter::and(left, right);
        }

        Ok(left)
    }

    /// Parses NOT expressions: `"-" not_expr | atom`
    fn parse_not_expr(&mut self) -> FilterResult<Filter> {
        if !self.check(&Token::Not) {
            return self.parse_atom();
        }

        let not = self.advance();
        self.enter(&not.token, not.position)?;
        let inner = self.parse_not_expr()?;
        self.leave();
        Ok(Filter::negate(inner))
    }

    /// Parses atoms: `"(" or_expr ")" | text | filter`
    fn parse_atom(&mut self) -> FilterResult<Filter> {
        let PositionedToken { token, position } = self.advance();

        match token {
            Token::OpenParen => {
                self.enter(&Token::OpenParen, position)?;
                let inner = self.parse_or_expr()?;
                if !self.check(&Token::CloseParen) {
                    return Err(SyntaxError::UnclosedParenthesis { position });
                }
                self.advance();
                self.leave();
                Ok(inner)
            }

            Token::Text(ref text) => {
                self.count_term(&token, position)?;
                Ok(Filter::Text(text.clone()))
            }

            Token::Filter(ref raw) => {
                self.count_term(&token, position)?;
                self.parse_filter_atom(raw, position)
            }

            Token::EndOfInput => Err(SyntaxError::UnexpectedEndOfInput {
                after: self.previous_text(),
                position,
            }),

            other @ (Token::And | Token::Or | Token::Not | Token::CloseParen) => {
                Err(SyntaxError::unexpected_token(other.to_string(), position))
            }
        }
    }

    /// Interprets a filter atom. Unknown names fall back to plain text.
    fn parse_filter_atom(&mut self, raw: &str, position: usize) -> FilterResult<Filter> {
        if let Some(rest) = raw.strip_prefix('@') {
            return parse_attribute(raw, rest, position);
        }

        let Some((name, criteria)) = raw.split_once(':') else {
            return Ok(Filter::Text(raw.to_string()));
        };

        let Some(kind) = FilterName::lookup(name) else {
            match suggest_filter_name(name) {
                Some(suggestion) => debug!(
                    atom = raw,
                    suggestion, "unknown filter name, matching as text"
                ),
                None => debug!(atom = raw, "unknown filter name, matching as text"),
            }
            return Ok(Filter::Text(raw.to_string()));
        };

        let criteria_position = position + name.len() + 1;

        match kind {
            FilterName::Depth => {
                let (op, value) = parse_comparison(raw, criteria, position)?;
                Ok(Filter::Depth(op, parse_count(raw, value, position)?))
            }
            FilterName::Children => {
                let (op, value) = parse_comparison(raw, criteria, position)?;
                Ok(Filter::Children(op, parse_count(raw, value, position)?))
            }
            FilterName::Created => {
                let (op, value) = parse_comparison(raw, criteria, position)?;
                Ok(Filter::CreatedDate(op, parse_date(raw, value, position)?))
            }
            FilterName::Modified => {
                let (op, value) = parse_comparison(raw, criteria, position)?;
                Ok(Filter::ModifiedDate(op, parse_date(raw, value, position)?))
            }
            FilterName::Parent => {
                let inner = self.parse_criteria_expr(raw, criteria, criteria_position, position)?;
                Ok(Filter::parent(inner))
            }
            FilterName::Ancestor => {
                let inner = self.parse_criteria_expr(raw, criteria, criteria_position, position)?;
                Ok(Filter::ancestor(inner))
            }
            FilterName::Reference => {
                let target = unquote(criteria);
                let target = target
                    .strip_prefix("[[")
                    .and_then(|t| t.strip_suffix("]]"))
                    .unwrap_or(target);
                if target.is_empty() {
                    return Err(SyntaxError::missing_value(raw, position));
                }
                Ok(Filter::Reference(target.to_string()))
            }
            FilterName::Tag => {
                let tag = unquote(criteria);
                let tag = tag.strip_prefix('#').unwrap_or(tag);
                if tag.is_empty() {
                    return Err(SyntaxError::missing_value(raw, position));
                }
                Ok(Filter::Tag(tag.to_string()))
            }
        }
    }

    /// Parses the criteria of `p:` / `a:` as a nested query.
    fn parse_criteria_expr(
        &mut self,
        raw: &str,
        criteria: &str,
        criteria_position: usize,
        position: usize,
    ) -> FilterResult<Filter> {
        if criteria.trim().is_empty() {
            return Err(SyntaxError::missing_value(raw, position));
        }
        if self.nesting + 1 > MAX_NESTING {
            return Err(SyntaxError::NestingTooDeep {
                token: raw.to_string(),
                position,
            });
        }
        let mut nested = Self::new(criteria, criteria_position, self.nesting + 1, self.terms);
        let inner = nested.parse_query()?;
        self.terms = nested.terms;
        Ok(inner)
    }
}

/// Splits a criteria string into its comparison operator and value.
///
/// Operators are matched longest first; no operator means `Equal`. An empty
/// value is an error.
fn parse_comparison<'a>(
    raw: &str,
    criteria: &'a str,
    position: usize,
) -> FilterResult<(ComparisonOp, &'a str)> {
    let (op, value) = ComparisonOp::PREFIXES
        .iter()
        .find_map(|(prefix, op)| criteria.strip_prefix(prefix).map(|rest| (*op, rest)))
        .unwrap_or((ComparisonOp::Equal, criteria));

    if value.is_empty() {
        return Err(SyntaxError::missing_value(raw, position));
    }
    Ok((op, value))
}

fn parse_count(raw: &str, value: &str, position: usize) -> FilterResult<usize> {
    let value = unquote(value);
    value
        .parse::<usize>()
        .map_err(|_| SyntaxError::invalid_number(raw, value, position))
}

fn parse_date(raw: &str, value: &str, position: usize) -> FilterResult<DateValue> {
    let value = unquote(value);
    DateValue::parse(value).ok_or_else(|| SyntaxError::invalid_date(raw, value, position))
}

/// Parses `key`, `key<op>value`; `rest` is the atom without its `@`.
fn parse_attribute(raw: &str, rest: &str, position: usize) -> FilterResult<Filter> {
    let split = rest
        .char_indices()
        .find(|&(i, c)| {
            matches!(c, '<' | '>' | '=') || (c == '!' && rest[i + 1..].starts_with('='))
        })
        .map(|(i, _)| i);

    let Some(split) = split else {
        return Ok(Filter::has_attribute(rest));
    };

    let key = &rest[..split];
    if key.is_empty() {
        return Ok(Filter::Text(raw.to_string()));
    }

    let (op, value) = parse_comparison(raw, &rest[split..], position)?;

    // Quoted values are always strings.
    if is_quoted(value) {
        return Ok(Filter::attribute(key, op, unquote(value)));
    }

    let test = match DateValue::parse(value) {
        Some(date) => AttributeTest::Date(op, date),
        None => AttributeTest::Text(op, value.to_string()),
    };
    Ok(Filter::Attribute {
        key: key.to_string(),
        test,
    })
}

fn is_quoted(value: &str) -> bool {
    value.starts_with('"')
}

/// Strips surrounding double quotes. An unterminated quote only loses its
/// opening mark.
fn unquote(value: &str) -> &str {
    let Some(inner) = value.strip_prefix('"') else {
        return value;
    };
    inner.strip_suffix('"').unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_filter_name() {
        assert_eq!(suggest_filter_name("chidren"), Some("children"));
        assert_eq!(suggest_filter_name("rfe"), Some("ref"));
        assert_eq!(suggest_filter_name("dd"), Some("d"));
        assert_eq!(suggest_filter_name("x"), None);
        assert_eq!(suggest_filter_name("children"), None);
        assert_eq!(suggest_filter_name("https"), None);
    }

    #[test]
    fn test_parse_comparison_longest_first() {
        assert_eq!(
            parse_comparison("x", ">=3", 0).unwrap(),
            (ComparisonOp::GreaterEqual, "3")
        );
        assert_eq!(
            parse_comparison("x", "!=3", 0).unwrap(),
            (ComparisonOp::NotEqual, "3")
        );
        assert_eq!(
            parse_comparison("x", "3", 0).unwrap(),
            (ComparisonOp::Equal, "3")
        );
        assert!(parse_comparison("x", "<=", 0).is_err());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("\"open"), "open");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\"\""), "");
    }
}
