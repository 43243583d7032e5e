//! Search result output formatting.

use std::collections::BTreeMap;

use outline_query::{NodeRef, OutlineNode};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::commands::saved::SavedResult;
use crate::commands::search::SearchResult;

use super::helpers::{format_tags, truncate_id, truncate_str};

/// JSON output structure for a matched node.
#[derive(Serialize)]
pub struct NodeOutput<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<&'a str>,
    pub tags: Vec<&'a str>,
    pub attributes: &'a BTreeMap<String, String>,
    pub created_at: String,
    pub modified_at: String,
}

impl<'a> NodeOutput<'a> {
    pub fn from_node(node: NodeRef<'a>) -> Self {
        let data = node.data();
        Self {
            id: &data.id,
            text: &data.text,
            depth: node.depth(),
            parent_id: node.parent().map(|p| p.data().id.as_str()),
            tags: data.tags.iter().map(String::as_str).collect(),
            attributes: &data.attributes,
            created_at: data.created_at.to_rfc3339(),
            modified_at: data.modified_at.to_rfc3339(),
        }
    }
}

/// JSON output structure for the search command.
#[derive(Serialize)]
pub struct SearchOutput<'a> {
    pub query: &'a str,
    /// The query as the parser understood it.
    pub normalized: String,
    /// True when a syntax error made the search fall back to plain text.
    pub fallback: bool,
    pub total: usize,
    pub has_more: bool,
    pub matches: Vec<NodeOutput<'a>>,
}

/// JSON output structure for one saved search.
#[derive(Serialize)]
pub struct SavedOutput<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total: usize,
    pub matches: Vec<NodeOutput<'a>>,
}

/// Formats search results as JSON.
pub fn format_search_json(result: &SearchResult<'_>) -> Result<String, serde_json::Error> {
    let output = SearchOutput {
        query: &result.query,
        normalized: result.filter.to_string(),
        fallback: result.fallback.is_some(),
        total: result.total,
        has_more: result.total > result.matches.len(),
        matches: result.matches.iter().map(|n| NodeOutput::from_node(*n)).collect(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats search results as a table, indenting text by depth.
pub fn format_search_table(result: &SearchResult<'_>, use_colors: bool) -> String {
    let mut output = format_nodes_table(&result.matches, use_colors);

    if result.total > result.matches.len() {
        let footer = format!(
            "Showing {} of {} matches (use --all or --limit to see more)",
            result.matches.len(),
            result.total
        );
        if use_colors {
            output.push_str(&format!("{}\n", footer.dimmed()));
        } else {
            output.push_str(&footer);
            output.push('\n');
        }
    }

    output
}

/// Formats nodes as a table.
pub fn format_nodes_table(nodes: &[NodeRef<'_>], use_colors: bool) -> String {
    if nodes.is_empty() {
        return "No matching nodes.\n".to_string();
    }

    let mut output = String::new();

    let header = format!("{:<8} {:<5} {:<20} {}", "ID", "Depth", "Tags", "Text");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for node in nodes {
        let data = node.data();
        let depth = node.depth();
        let indent = "  ".repeat(depth.min(8));
        let tags = format_tags(&data.tags, 20);
        let id = truncate_id(&data.id);
        let id = if use_colors {
            format!("{:<8}", id).cyan().to_string()
        } else {
            format!("{:<8}", id)
        };

        output.push_str(&format!(
            "{} {:<5} {:<20} {}{}\n",
            id,
            depth,
            tags,
            indent,
            truncate_str(&data.text, 60)
        ));
    }

    output
}

/// Formats saved searches as JSON.
pub fn format_saved_json(results: &[SavedResult<'_>]) -> Result<String, serde_json::Error> {
    let output: Vec<SavedOutput> = results
        .iter()
        .map(|result| {
            let data = result.search.node().data();
            let (error, total, matches) = match &result.outcome {
                Ok(nodes) => (
                    None,
                    result.total,
                    nodes.iter().map(|n| NodeOutput::from_node(*n)).collect(),
                ),
                Err(e) => (Some(e.to_string()), 0, Vec::new()),
            };
            SavedOutput {
                id: &data.id,
                title: &data.text,
                query: result.search.query(),
                error,
                total,
                matches,
            }
        })
        .collect();
    serde_json::to_string_pretty(&output)
}

/// Formats saved searches as a table, one section per search.
pub fn format_saved_table(results: &[SavedResult<'_>], use_colors: bool) -> String {
    if results.is_empty() {
        return "No saved searches. Add an @search attribute to a node to create one.\n"
            .to_string();
    }

    let mut output = String::new();

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        let data = result.search.node().data();
        let title = format!("{} ({})", data.text, truncate_id(&data.id));
        if use_colors {
            output.push_str(&format!(
                "{}  {}\n",
                title.bold(),
                result.search.query().dimmed()
            ));
        } else {
            output.push_str(&format!("{}  {}\n", title, result.search.query()));
        }

        match &result.outcome {
            Ok(nodes) => {
                output.push_str(&format_nodes_table(nodes, use_colors));
                if result.total > nodes.len() {
                    output.push_str(&format!(
                        "Showing {} of {} matches\n",
                        nodes.len(),
                        result.total
                    ));
                }
            }
            Err(e) => {
                let line = format!("Invalid query: {e}");
                if use_colors {
                    output.push_str(&format!("{}\n", line.red()));
                } else {
                    output.push_str(&line);
                    output.push('\n');
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_query::{NodeData, Outline};

    fn outline() -> Outline {
        let mut outline = Outline::new();
        let root = outline
            .add_root(NodeData::new("root-node-1", "Projects").with_tag("area"))
            .unwrap();
        outline
            .add_child(root, NodeData::new("child", "Write report"))
            .unwrap();
        outline
    }

    #[test]
    fn test_nodes_table_empty() {
        assert_eq!(format_nodes_table(&[], false), "No matching nodes.\n");
    }

    #[test]
    fn test_nodes_table_indents_by_depth() {
        let outline = outline();
        let nodes: Vec<NodeRef> = outline.iter().collect();
        let table = format_nodes_table(&nodes, false);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("root-nod"));
        assert!(lines[1].contains("#area"));
        assert!(lines[1].ends_with(" Projects"));
        assert!(lines[2].starts_with("child"));
        assert!(lines[2].ends_with("  Write report"));
    }

    #[test]
    fn test_node_output_json_shape() {
        let outline = outline();
        let child = outline.find_by_id("child").unwrap();
        let json = serde_json::to_value(NodeOutput::from_node(child)).unwrap();

        assert_eq!(json["id"], "child");
        assert_eq!(json["depth"], 1);
        assert_eq!(json["parent_id"], "root-node-1");
        assert!(json["tags"].as_array().unwrap().is_empty());
    }
}
