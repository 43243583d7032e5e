//! Error types for the query parser.

use thiserror::Error;

/// A specialized Result type for query parsing operations.
pub type FilterResult<T> = Result<T, SyntaxError>;

/// Errors that can occur while parsing a query.
///
/// Every variant carries the offending fragment of the query and its byte
/// position, so hosts can show the problem inline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxError {
    /// A token appeared where it cannot start or continue an expression.
    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token text.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// The query ended in the middle of an expression.
    #[error("unexpected end of query after '{after}'")]
    UnexpectedEndOfInput {
        /// Text of the last token before the end.
        after: String,
        /// Byte offset of the end of input.
        position: usize,
    },

    /// A `(` was never closed.
    #[error("unclosed parenthesis at position {position}")]
    UnclosedParenthesis {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// A filter has an operator (or a bare `name:`) but no value.
    #[error("missing comparison value in '{filter}'")]
    MissingValue {
        /// The filter atom as typed.
        filter: String,
        /// Byte offset of the filter atom.
        position: usize,
    },

    /// A depth or children filter has a value that is not a whole number.
    #[error("invalid number '{value}' in '{filter}'")]
    InvalidNumber {
        /// The filter atom as typed.
        filter: String,
        /// The rejected value.
        value: String,
        /// Byte offset of the filter atom.
        position: usize,
    },

    /// A created/modified filter has a value that is neither a date nor an offset.
    #[error("invalid date '{value}' in '{filter}' (expected YYYY-MM-DD or an offset like -7d)")]
    InvalidDate {
        /// The filter atom as typed.
        filter: String,
        /// The rejected value.
        value: String,
        /// Byte offset of the filter atom.
        position: usize,
    },

    /// Groups, negations or nested filters are nested too deeply.
    #[error("query nested too deeply at '{token}'")]
    NestingTooDeep {
        /// The token where the limit was hit.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// The query has more atoms than a single expression may hold.
    #[error("query has too many terms at '{token}'")]
    TooManyTerms {
        /// The atom where the limit was hit.
        token: String,
        /// Byte offset of the atom.
        position: usize,
    },
}

impl SyntaxError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        SyntaxError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates a missing value error.
    pub fn missing_value(filter: impl Into<String>, position: usize) -> Self {
        SyntaxError::MissingValue {
            filter: filter.into(),
            position,
        }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(filter: impl Into<String>, value: impl Into<String>, position: usize) -> Self {
        SyntaxError::InvalidNumber {
            filter: filter.into(),
            value: value.into(),
            position,
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(filter: impl Into<String>, value: impl Into<String>, position: usize) -> Self {
        SyntaxError::InvalidDate {
            filter: filter.into(),
            value: value.into(),
            position,
        }
    }

    /// The query fragment the error refers to.
    pub fn fragment(&self) -> &str {
        match self {
            SyntaxError::UnexpectedToken { token, .. } => token,
            SyntaxError::UnexpectedEndOfInput { after, .. } => after,
            SyntaxError::UnclosedParenthesis { .. } => "(",
            SyntaxError::MissingValue { filter, .. } => filter,
            SyntaxError::InvalidNumber { filter, .. } => filter,
            SyntaxError::InvalidDate { filter, .. } => filter,
            SyntaxError::NestingTooDeep { token, .. } => token,
            SyntaxError::TooManyTerms { token, .. } => token,
        }
    }

    /// Byte offset of the fragment in the query.
    pub fn position(&self) -> usize {
        match self {
            SyntaxError::UnexpectedToken { position, .. }
            | SyntaxError::UnexpectedEndOfInput { position, .. }
            | SyntaxError::UnclosedParenthesis { position }
            | SyntaxError::MissingValue { position, .. }
            | SyntaxError::InvalidNumber { position, .. }
            | SyntaxError::InvalidDate { position, .. }
            | SyntaxError::NestingTooDeep { position, .. }
            | SyntaxError::TooManyTerms { position, .. } => *position,
        }
    }
}
