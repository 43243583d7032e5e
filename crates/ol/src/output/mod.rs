//! Output formatting utilities for the ol CLI.
//!
//! This module provides functions for formatting data as tables or JSON.
//! It is organized into submodules by command:
//!
//! - [`matches`] - Search and saved search results
//! - [`explain`] - Match explanations
//! - [`parse`] - Expression trees and lexer tokens
//! - [`helpers`] - Common formatting utilities (truncation, tags, syntax errors)

mod explain;
pub mod helpers;
mod matches;
mod parse;

pub use explain::{format_explanation_json, format_explanation_tree};
pub use matches::{format_saved_json, format_saved_table, format_search_json, format_search_table};
pub use parse::{format_parse_json, format_parse_tree, format_tokens_json, format_tokens_table};
