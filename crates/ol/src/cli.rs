//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the ol CLI.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

/// ol - Search hierarchical outlines with a compact query language
#[derive(Parser, Debug)]
#[command(name = "ol")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Outline file (default: from config, then the user data directory)
    #[arg(short, long, global = true, env = "OL_OUTLINE")]
    pub file: Option<PathBuf>,

    /// Evaluate dates as of this instant (RFC 3339) instead of now
    #[arg(long, global = true, value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the outline
    #[command(alias = "s")]
    Search {
        /// Query, e.g. "@status=done -children:0"
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Limit results (default: from config, or 50)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Show all matches (no limit)
        #[arg(long, conflicts_with = "limit")]
        all: bool,

        /// Fail on syntax errors instead of falling back to a text match
        #[arg(long)]
        strict: bool,
    },

    /// Interactive search: type queries and see the top matches
    #[command(alias = "q")]
    Quick {
        /// Matches shown per query (default: 10)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Explain why a node does or does not match a query
    Explain {
        /// Query to evaluate
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Node ID
        #[arg(long)]
        node: String,
    },

    /// Show how a query is parsed
    Parse {
        /// Query to parse
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Show lexer tokens instead of the expression tree
        #[arg(long)]
        tokens: bool,
    },

    /// List saved searches with their current results
    Saved {
        /// Matches shown per saved search (default: from config, or 50)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp like 2025-11-10T12:00:00Z ({e})"))
}
