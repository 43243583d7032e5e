//! Search command implementation.
//!
//! Parses a query and lists matching nodes in document order.

use outline_query::filter::{parse_query, EvalContext, Filter, FilterEvaluator, SyntaxError};
use outline_query::{NodeRef, Outline};
use tracing::debug;

use super::{CommandContext, CommandError, Result};
use crate::output::{format_search_json, format_search_table, helpers::format_syntax_error};

/// Options for the search command.
#[derive(Debug)]
pub struct SearchOptions {
    /// Query as typed.
    pub query: String,
    /// Maximum matches to show (None = config default).
    pub limit: Option<usize>,
    /// Show every match.
    pub all: bool,
    /// Fail on syntax errors.
    pub strict: bool,
}

/// Result of a search.
#[derive(Debug)]
pub struct SearchResult<'a> {
    /// Query as typed.
    pub query: String,
    /// The expression that was evaluated.
    pub filter: Filter,
    /// Set when the query did not parse and was searched as plain text.
    pub fallback: Option<SyntaxError>,
    /// Number of matches before the limit was applied.
    pub total: usize,
    /// Matches in document order, at most `limit` of them.
    pub matches: Vec<NodeRef<'a>>,
}

/// Parses `query`, falling back to a literal text search on syntax errors
/// unless `strict` is set.
pub fn resolve_filter(query: &str, strict: bool) -> Result<(Filter, Option<SyntaxError>)> {
    match parse_query(query) {
        Ok(filter) => Ok((filter, None)),
        Err(e) if strict => Err(CommandError::syntax(query, e)),
        Err(e) => {
            debug!(query, error = %e, "query did not parse, searching as plain text");
            Ok((Filter::text(query.trim()), Some(e)))
        }
    }
}

/// Runs a search over the outline.
pub fn run_search<'a>(
    outline: &'a Outline,
    query: &str,
    strict: bool,
    limit: Option<usize>,
    context: &EvalContext,
) -> Result<SearchResult<'a>> {
    let (filter, fallback) = resolve_filter(query, strict)?;

    let mut matches = FilterEvaluator::new(&filter, *context).find_matches(outline.roots());
    let total = matches.len();
    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    debug!(filter = %filter, total, shown = matches.len(), "search finished");

    Ok(SearchResult {
        query: query.to_string(),
        filter,
        fallback,
        total,
        matches,
    })
}

/// Executes the search command.
pub fn execute(ctx: &CommandContext, opts: &SearchOptions) -> Result<()> {
    let outline = ctx.load_outline()?;
    let limit = if opts.all {
        None
    } else {
        Some(opts.limit.unwrap_or(ctx.limit))
    };

    let result = run_search(
        &outline,
        &opts.query,
        opts.strict || ctx.strict,
        limit,
        &ctx.eval,
    )?;

    if ctx.verbose {
        eprintln!("Query: {}", result.filter);
    }

    if let Some(ref error) = result.fallback {
        if !ctx.quiet && !ctx.json_output {
            eprint!("{}", format_syntax_error(&opts.query, error, ctx.use_colors));
            eprintln!("Searching for the literal text instead (use --strict to fail).\n");
        }
    }

    if ctx.json_output {
        println!("{}", format_search_json(&result)?);
    } else {
        print!("{}", format_search_table(&result, ctx.use_colors));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use outline_query::{NodeData, OutlineNode};

    fn context() -> EvalContext {
        EvalContext::new(Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap())
    }

    fn outline() -> Outline {
        let mut outline = Outline::new();
        let project = outline
            .add_root(NodeData::new("p", "Launch").with_attribute("type", "project"))
            .unwrap();
        for (id, status) in [("t1", "done"), ("t2", "todo"), ("t3", "done")] {
            outline
                .add_child(
                    project,
                    NodeData::new(id, format!("Task {id}")).with_attribute("status", status),
                )
                .unwrap();
        }
        outline
            .add_root(NodeData::new("odd", "price d:> 5"))
            .unwrap();
        outline
    }

    fn ids(result: &SearchResult<'_>) -> Vec<String> {
        result.matches.iter().map(|n| n.id().to_string()).collect()
    }

    #[test]
    fn test_search_in_document_order() {
        let outline = outline();
        let result = run_search(&outline, "@status=done", false, None, &context()).unwrap();
        assert_eq!(ids(&result), ["t1", "t3"]);
        assert_eq!(result.total, 2);
        assert!(result.fallback.is_none());
    }

    #[test]
    fn test_search_limit_keeps_total() {
        let outline = outline();
        let result = run_search(&outline, "task", false, Some(2), &context()).unwrap();
        assert_eq!(ids(&result), ["t1", "t2"]);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn test_search_falls_back_to_text() {
        let outline = outline();
        let result = run_search(&outline, "d:>", false, None, &context()).unwrap();
        assert!(result.fallback.is_some());
        assert_eq!(result.filter, Filter::text("d:>"));
        assert_eq!(ids(&result), ["odd"]);
    }

    #[test]
    fn test_search_strict_reports_syntax_error() {
        let outline = outline();
        let err = run_search(&outline, "d:>", true, None, &context()).unwrap_err();
        match err {
            CommandError::Syntax { query, source } => {
                assert_eq!(query, "d:>");
                assert_eq!(source.fragment(), "d:>");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_query_lists_everything() {
        let outline = outline();
        let result = run_search(&outline, "", true, None, &context()).unwrap();
        assert_eq!(result.total, outline.len());
    }
}
