//! Lexer (tokenizer) for query strings.
//!
//! The lexer never fails: anything it cannot classify becomes a text token, and
//! the token stream always ends with exactly one [`Token::EndOfInput`].
//!
//! A `-` at the start of a token is always emitted as [`Token::Not`]. When it is
//! directly followed by a letter or `_` the next token is the negated atom
//! itself (`-children:0`, `-draft`); whether that atom is a known filter is left
//! to the parser.

use std::fmt;

/// A token in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Plain or quoted text.
    Text(String),

    /// A filter atom as typed, e.g. `d:>2`, `@status=done`, `p:(x y)`.
    Filter(String),

    /// The explicit AND operator (`+`).
    And,

    /// The OR operator (`|`).
    Or,

    /// The NOT operator (`-`).
    Not,

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,

    /// End of the query.
    EndOfInput,
}

impl Token {
    /// Returns true if this token can start an atom, which is what triggers an
    /// implicit AND between adjacent atoms.
    pub fn starts_atom(&self) -> bool {
        matches!(
            self,
            Token::Text(_) | Token::Filter(_) | Token::Not | Token::OpenParen
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(text) => f.write_str(text),
            Token::Filter(raw) => f.write_str(raw),
            Token::And => f.write_str("+"),
            Token::Or => f.write_str("|"),
            Token::Not => f.write_str("-"),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::EndOfInput => f.write_str("end of query"),
        }
    }
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: Token,
    /// The byte position where the token starts.
    pub position: usize,
}

/// Characters that end a bare text run.
fn ends_text(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '|' | '+' | '"')
}

/// Characters that may start a filter name or follow a negating `-`.
fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Lexer for tokenizing query strings.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in `input`.
    position: usize,
    /// Added to every reported position (used for nested filter criteria).
    base: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self::with_base(input, 0)
    }

    /// Creates a lexer whose reported positions start at `base`.
    pub(crate) fn with_base(input: &'a str, base: usize) -> Self {
        Self {
            input,
            position: 0,
            base,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    fn positioned(&self, token: Token, start: usize) -> PositionedToken {
        PositionedToken {
            token,
            position: self.base + start,
        }
    }

    /// Reads a `"`-delimited string verbatim. An unterminated quote runs to
    /// the end of the input.
    fn read_quoted(&mut self) -> String {
        self.next_char();
        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == '"' {
                break;
            }
            result.push(c);
        }
        result
    }

    /// Copies a quoted section into `raw`, quotes included.
    fn copy_quoted(&mut self, raw: &mut String) {
        raw.push('"');
        let inner = self.read_quoted();
        raw.push_str(&inner);
        raw.push('"');
    }

    /// Copies a parenthesized group into `raw`, tracking nesting and quotes.
    fn copy_balanced(&mut self, raw: &mut String) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.copy_quoted(raw);
                    continue;
                }
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
            raw.push(c);
            self.next_char();
            if depth == 0 {
                break;
            }
        }
    }

    /// Reads a filter's criteria: an optional comparison operator and a value.
    ///
    /// Stops at whitespace, `|`, `)` and `+`, except that a `+` directly after
    /// the operator is the sign of the value (`@due<+7d`).
    fn read_criteria(&mut self, raw: &mut String) {
        if self.peek() == Some('(') {
            self.copy_balanced(raw);
            return;
        }

        let mut at_value_start = true;
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.copy_quoted(raw);
                    at_value_start = false;
                    continue;
                }
                c if c.is_whitespace() || c == '|' || c == ')' => break,
                '+' if !at_value_start => break,
                '<' | '>' | '=' | '!' if at_value_start => {}
                _ => at_value_start = false,
            }
            raw.push(c);
            self.next_char();
        }
    }

    /// Reads `@key[op value]`. The `@` has not been consumed yet.
    fn read_attribute(&mut self, start: usize) -> PositionedToken {
        self.next_char();
        let mut raw = String::from("@");
        while let Some(c) = self.peek() {
            let is_operator = matches!(c, '<' | '>' | '=')
                || (c == '!' && self.peek_second() == Some('='));
            if ends_text(c) || is_operator {
                break;
            }
            raw.push(c);
            self.next_char();
        }

        if raw.len() == 1 {
            // No key: `@` is ordinary text.
            self.read_text_into(&mut raw);
            return self.positioned(Token::Text(raw), start);
        }

        self.read_criteria(&mut raw);
        self.positioned(Token::Filter(raw), start)
    }

    /// Reads a bare word, or a named filter when the leading letters are
    /// followed by `:`.
    fn read_word(&mut self, start: usize) -> PositionedToken {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if !is_identifier_start(c) {
                break;
            }
            raw.push(c);
            self.next_char();
        }

        if !raw.is_empty() && self.peek() == Some(':') {
            self.next_char();
            raw.push(':');
            self.read_criteria(&mut raw);
            return self.positioned(Token::Filter(raw), start);
        }

        self.read_text_into(&mut raw);
        self.positioned(Token::Text(raw), start)
    }

    fn read_text_into(&mut self, raw: &mut String) {
        while let Some(c) = self.peek() {
            if ends_text(c) {
                break;
            }
            raw.push(c);
            self.next_char();
        }
    }

    /// Returns the next token with its position.
    pub fn next_token(&mut self) -> PositionedToken {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek() else {
            return self.positioned(Token::EndOfInput, start);
        };

        match c {
            '(' => {
                self.next_char();
                self.positioned(Token::OpenParen, start)
            }
            ')' => {
                self.next_char();
                self.positioned(Token::CloseParen, start)
            }
            '|' => {
                self.next_char();
                self.positioned(Token::Or, start)
            }
            '+' => {
                self.next_char();
                self.positioned(Token::And, start)
            }
            '-' => {
                self.next_char();
                self.positioned(Token::Not, start)
            }
            '"' => {
                let text = self.read_quoted();
                self.positioned(Token::Text(text), start)
            }
            '@' => self.read_attribute(start),
            c if is_identifier_start(c) => self.read_word(start),
            _ => {
                let mut raw = String::new();
                self.read_text_into(&mut raw);
                self.positioned(Token::Text(raw), start)
            }
        }
    }

    /// Tokenizes the whole input. The last token is always `EndOfInput`.
    pub fn tokenize(mut self) -> Vec<PositionedToken> {
        let mut tokens = Vec::new();
        loop {
            let positioned = self.next_token();
            let done = positioned.token == Token::EndOfInput;
            tokens.push(positioned);
            if done {
                return tokens;
            }
        }
    }
}

/// Tokenizes a query into bare tokens (without positions).
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .into_iter()
        .map(|positioned| positioned.token)
        .collect()
}
