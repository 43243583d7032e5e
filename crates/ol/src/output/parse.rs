//! Parse command output: expression trees and token listings.

use outline_query::filter::{AttributeTest, Filter, PositionedToken, Token};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON output structure for the parse command.
#[derive(Serialize)]
pub struct ParseOutput<'a> {
    pub query: &'a str,
    pub normalized: String,
    pub ast: &'a Filter,
}

/// JSON output structure for one token.
#[derive(Serialize)]
pub struct TokenOutput {
    pub position: usize,
    pub kind: &'static str,
    pub text: String,
}

fn token_kind(token: &Token) -> &'static str {
    match token {
        Token::Text(_) => "text",
        Token::Filter(_) => "filter",
        Token::And => "and",
        Token::Or => "or",
        Token::Not => "not",
        Token::OpenParen => "open_paren",
        Token::CloseParen => "close_paren",
        Token::EndOfInput => "end",
    }
}

/// Formats a parsed query as JSON.
pub fn format_parse_json(query: &str, filter: &Filter) -> Result<String, serde_json::Error> {
    let output = ParseOutput {
        query,
        normalized: filter.to_string(),
        ast: filter,
    };
    serde_json::to_string_pretty(&output)
}

/// Formats a parsed query as its normalized form followed by an indented tree.
pub fn format_parse_tree(filter: &Filter, use_colors: bool) -> String {
    let normalized = filter.to_string();
    let mut output = if use_colors {
        format!("{} {}\n\n", "Normalized:".bold(), normalized)
    } else {
        format!("Normalized: {}\n\n", normalized)
    };
    push_node(&mut output, filter, 0, use_colors);
    output
}

fn push_node(output: &mut String, filter: &Filter, depth: usize, use_colors: bool) {
    let indent = "  ".repeat(depth);
    let (label, detail, operands): (&str, String, Vec<&Filter>) = match filter {
        Filter::AlwaysMatch => ("ALL", String::new(), vec![]),
        Filter::Text(text) => ("TEXT", format!("{text:?}"), vec![]),
        Filter::Depth(op, n) => ("DEPTH", format!("{op} {n}"), vec![]),
        Filter::Children(op, n) => ("CHILDREN", format!("{op} {n}"), vec![]),
        Filter::Attribute { key, test } => {
            let detail = match test {
                AttributeTest::Exists => format!("@{key} is set"),
                AttributeTest::Text(op, value) => format!("@{key} {op} {value:?}"),
                AttributeTest::Date(op, date) => format!("@{key} {op} date {date}"),
            };
            ("ATTRIBUTE", detail, vec![])
        }
        Filter::CreatedDate(op, date) => ("CREATED", format!("{op} {date}"), vec![]),
        Filter::ModifiedDate(op, date) => ("MODIFIED", format!("{op} {date}"), vec![]),
        Filter::Tag(tag) => ("TAG", format!("#{tag}"), vec![]),
        Filter::Reference(target) => ("REF", format!("[[{target}]]"), vec![]),
        Filter::Parent(inner) => ("PARENT", String::new(), vec![inner.as_ref()]),
        Filter::Ancestor(inner) => ("ANCESTOR", String::new(), vec![inner.as_ref()]),
        Filter::And(left, right) => ("AND", String::new(), vec![left.as_ref(), right.as_ref()]),
        Filter::Or(left, right) => ("OR", String::new(), vec![left.as_ref(), right.as_ref()]),
        Filter::Not(inner) => ("NOT", String::new(), vec![inner.as_ref()]),
    };

    let label = if use_colors {
        label.cyan().to_string()
    } else {
        label.to_string()
    };
    if detail.is_empty() {
        output.push_str(&format!("{indent}{label}\n"));
    } else {
        output.push_str(&format!("{indent}{label} {detail}\n"));
    }

    for operand in operands {
        push_node(output, operand, depth + 1, use_colors);
    }
}

/// Formats lexer tokens as JSON.
pub fn format_tokens_json(tokens: &[PositionedToken]) -> Result<String, serde_json::Error> {
    let output: Vec<TokenOutput> = tokens
        .iter()
        .map(|t| TokenOutput {
            position: t.position,
            kind: token_kind(&t.token),
            text: t.token.to_string(),
        })
        .collect();
    serde_json::to_string_pretty(&output)
}

/// Formats lexer tokens as a table.
pub fn format_tokens_table(tokens: &[PositionedToken], use_colors: bool) -> String {
    let mut output = String::new();

    let header = format!("{:<5} {:<12} {}", "Pos", "Kind", "Text");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for t in tokens {
        output.push_str(&format!(
            "{:<5} {:<12} {}\n",
            t.position,
            token_kind(&t.token),
            t.token
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_query::filter::{parse_query, Lexer};

    #[test]
    fn test_parse_tree_shape() {
        let filter = parse_query("-done (a | @status=open)").unwrap();
        let tree = format_parse_tree(&filter, false);
        let lines: Vec<&str> = tree.lines().collect();

        assert!(lines[0].starts_with("Normalized: "));
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "AND");
        assert_eq!(lines[3], "  NOT");
        assert_eq!(lines[4], "    TEXT \"done\"");
        assert_eq!(lines[5], "  OR");
        assert_eq!(lines[6], "    TEXT \"a\"");
        assert_eq!(lines[7], "    ATTRIBUTE @status = \"open\"");
    }

    #[test]
    fn test_parse_json_contains_ast() {
        let filter = parse_query("d:>1").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&format_parse_json("d:>1", &filter).unwrap()).unwrap();
        assert_eq!(json["query"], "d:>1");
        assert_eq!(json["normalized"], "d:>1");
        assert!(json["ast"].get("depth").is_some());
    }

    #[test]
    fn test_tokens_table() {
        let tokens = Lexer::new("a | -b").tokenize();
        let table = format_tokens_table(&tokens, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("0     text"));
        assert!(lines[2].starts_with("2     or"));
        assert!(lines[3].starts_with("4     not"));
        assert!(lines[5].contains("end"));
    }
}
