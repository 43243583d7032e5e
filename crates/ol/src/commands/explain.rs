//! Explain command implementation.

use outline_query::filter::{parse_query, FilterEvaluator};

use super::{CommandContext, CommandError, Result};
use crate::output::{format_explanation_json, format_explanation_tree};

/// Executes the explain command: shows how `query` evaluates against one node.
pub fn execute(ctx: &CommandContext, query: &str, node_id: &str) -> Result<()> {
    let filter = parse_query(query).map_err(|e| CommandError::syntax(query, e))?;
    let outline = ctx.load_outline()?;
    let node = outline
        .find_by_id(node_id)
        .ok_or_else(|| CommandError::NodeNotFound(node_id.to_string()))?;

    let explanation = FilterEvaluator::new(&filter, ctx.eval).explain(node);

    if ctx.json_output {
        println!("{}", format_explanation_json(query, node, &explanation)?);
    } else {
        print!("{}", format_explanation_tree(node, &explanation, ctx.use_colors));
    }

    Ok(())
}
