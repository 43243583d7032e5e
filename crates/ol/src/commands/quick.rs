//! Quick search command implementation.
//!
//! Prompts for queries in a loop and shows the top matches for each. An empty
//! line exits. A query that does not parse is shown with its error and searched
//! as plain text, unless `search.strict` is set.

use std::io::{self, IsTerminal};

use dialoguer::Input;
use outline_query::filter::EvalContext;
use outline_query::Outline;
use owo_colors::OwoColorize;

use super::search::run_search;
use super::{CommandContext, CommandError, Result};
use crate::output::{format_search_table, helpers::format_syntax_error};

/// Matches shown per query when no limit is given.
const QUICK_LIMIT: usize = 10;

/// Executes the quick command.
pub fn execute(ctx: &CommandContext, limit: Option<usize>) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(CommandError::Config(
            "quick search needs an interactive terminal; use 'ol search <query>' instead"
                .to_string(),
        ));
    }

    let outline = ctx.load_outline()?;
    let limit = limit.unwrap_or(QUICK_LIMIT);

    if !ctx.quiet {
        let banner = format!(
            "Searching {} nodes in {}. Empty query exits.",
            outline.len(),
            ctx.outline_path.display()
        );
        if ctx.use_colors {
            println!("{}", banner.dimmed());
        } else {
            println!("{banner}");
        }
    }

    loop {
        let query: String = Input::new()
            .with_prompt("query")
            .allow_empty(true)
            .interact_text()?;

        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        // Dates resolve against the clock at the time each query is entered.
        let eval = ctx.current_eval();
        print!(
            "{}",
            render_query(&outline, query, ctx.strict, limit, &eval, ctx.use_colors)?
        );
        println!();
    }
}

/// Runs one interactive query and renders its matches.
///
/// Syntax errors are rendered inline rather than returned, followed by the
/// plain text matches unless `strict` is set.
pub fn render_query(
    outline: &Outline,
    query: &str,
    strict: bool,
    limit: usize,
    eval: &EvalContext,
    use_colors: bool,
) -> Result<String> {
    match run_search(outline, query, strict, Some(limit), eval) {
        Ok(result) => {
            let mut output = String::new();
            if let Some(ref error) = result.fallback {
                output.push_str(&format_syntax_error(query, error, use_colors));
                output.push_str("Showing plain text matches.\n");
            }
            output.push_str(&format_search_table(&result, use_colors));
            Ok(output)
        }
        Err(CommandError::Syntax { query, source }) => {
            Ok(format_syntax_error(&query, &source, use_colors))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use outline_query::NodeData;

    fn eval_on(day: u32) -> EvalContext {
        EvalContext::new(Utc.with_ymd_and_hms(2025, 11, day, 12, 0, 0).unwrap())
    }

    fn outline() -> Outline {
        let mut outline = Outline::new();
        outline.add_root(NodeData::new("plain", "Plain note")).unwrap();
        outline.add_root(NodeData::new("odd", "price d:> 5")).unwrap();
        outline
            .add_root(NodeData::new("due", "Invoice").with_attribute("due", "2025-11-09"))
            .unwrap();
        outline
    }

    #[test]
    fn test_syntax_error_shows_error_and_text_matches() {
        let output = render_query(&outline(), "d:>", false, 10, &eval_on(10), false).unwrap();

        assert!(output.starts_with("Syntax error: "));
        assert!(output.contains("  d:>\n  ^\n"));
        assert!(output.contains("Showing plain text matches."));
        assert!(output.contains("odd"));
        assert!(!output.contains("Plain note"));
    }

    #[test]
    fn test_strict_shows_only_the_error() {
        let output = render_query(&outline(), "d:>", true, 10, &eval_on(10), false).unwrap();

        assert!(output.starts_with("Syntax error: "));
        assert!(!output.contains("odd"));
    }

    #[test]
    fn test_valid_query_has_no_error() {
        let output = render_query(&outline(), "note", false, 10, &eval_on(10), false).unwrap();

        assert!(!output.contains("Syntax error"));
        assert!(output.contains("Plain note"));
    }

    #[test]
    fn test_relative_dates_follow_the_context() {
        let outline = outline();
        let query = "@due=-1d";
        let yesterday = render_query(&outline, query, false, 10, &eval_on(10), false).unwrap();
        let later = render_query(&outline, query, false, 10, &eval_on(11), false).unwrap();

        assert!(yesterday.contains("Invoice"));
        assert!(later.contains("No matching nodes."));
    }
}
