//! Parse command implementation.

use outline_query::filter::{parse_query, Lexer};

use super::{CommandContext, CommandError, Result};
use crate::output::{format_parse_json, format_parse_tree, format_tokens_json, format_tokens_table};

/// Executes the parse command: prints the expression tree or the lexer tokens.
///
/// Tokens are listed even for queries that fail to parse.
pub fn execute(ctx: &CommandContext, query: &str, tokens: bool) -> Result<()> {
    if tokens {
        let tokens = Lexer::new(query).tokenize();
        if ctx.json_output {
            println!("{}", format_tokens_json(&tokens)?);
        } else {
            print!("{}", format_tokens_table(&tokens, ctx.use_colors));
        }
        return Ok(());
    }

    let filter = parse_query(query).map_err(|e| CommandError::syntax(query, e))?;
    if ctx.json_output {
        println!("{}", format_parse_json(query, &filter)?);
    } else {
        print!("{}", format_parse_tree(&filter, ctx.use_colors));
    }

    Ok(())
}
