//! Saved searches command implementation.
//!
//! Lists every node carrying an `@search` attribute together with the nodes
//! its query currently selects.

use outline_query::filter::{EvalContext, SyntaxError};
use outline_query::{saved_searches, NodeRef, Outline, SavedSearch};

use super::{CommandContext, Result};
use crate::output::{format_saved_json, format_saved_table};

/// One saved search and its current results.
pub struct SavedResult<'a> {
    pub search: SavedSearch<'a>,
    /// Matches (at most the limit), or the query's syntax error.
    pub outcome: std::result::Result<Vec<NodeRef<'a>>, SyntaxError>,
    /// Number of matches before the limit was applied.
    pub total: usize,
}

/// Materializes every saved search in the outline.
///
/// A saved search with an invalid query is reported, not fatal.
pub fn collect_saved<'a>(
    outline: &'a Outline,
    context: &EvalContext,
    limit: usize,
) -> Vec<SavedResult<'a>> {
    saved_searches(outline)
        .into_iter()
        .map(|search| match search.materialize(outline, context) {
            Ok(mut nodes) => {
                let total = nodes.len();
                nodes.truncate(limit);
                SavedResult {
                    search,
                    outcome: Ok(nodes),
                    total,
                }
            }
            Err(e) => {
                tracing::debug!(search = search.query(), error = %e, "saved search does not parse");
                SavedResult {
                    search,
                    outcome: Err(e),
                    total: 0,
                }
            }
        })
        .collect()
}

/// Executes the saved command.
pub fn execute(ctx: &CommandContext, limit: Option<usize>) -> Result<()> {
    let outline = ctx.load_outline()?;
    let results = collect_saved(&outline, &ctx.eval, limit.unwrap_or(ctx.limit));

    if ctx.json_output {
        println!("{}", format_saved_json(&results)?);
    } else {
        print!("{}", format_saved_table(&results, ctx.use_colors));
    }

    Ok(())
}
