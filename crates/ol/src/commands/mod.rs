//! Command implementations for the ol CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod completions;
pub mod config;
pub mod explain;
pub mod parse;
pub mod quick;
pub mod saved;
pub mod search;

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Offset, TimeZone, Utc};
use outline_query::filter::{EvalContext, SyntaxError};
use outline_query::{Outline, OutlineStore, StoreError};

use crate::cli::Cli;
use config::Config;

/// Default number of matches shown when neither the flag nor the config sets one.
pub const DEFAULT_LIMIT: usize = 50;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Query syntax error.
    #[error("syntax error: {source}")]
    Syntax {
        /// The query as typed.
        query: String,
        /// The parser error.
        #[source]
        source: SyntaxError,
    },

    /// Outline store error.
    #[error("outline error: {0}")]
    Store(#[from] StoreError),

    /// No node carries the requested ID.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Interactive prompt error.
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Wraps a parser error together with the query it came from.
    pub fn syntax(query: impl Into<String>, source: SyntaxError) -> Self {
        CommandError::Syntax {
            query: query.into(),
            source,
        }
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
    /// Outline file to query.
    pub outline_path: PathBuf,
    /// Evaluation instant and local offset for relative dates.
    pub eval: EvalContext,
    /// Instant pinned with `--now`.
    pub pinned_now: Option<DateTime<Utc>>,
    /// Configured timezone for the local calendar day.
    pub timezone: Option<chrono_tz::Tz>,
    /// Default match limit.
    pub limit: usize,
    /// Whether syntax errors fail instead of falling back to text search.
    pub strict: bool,
}

impl CommandContext {
    /// Creates a command context from CLI arguments and the loaded config.
    ///
    /// Flags win over config values, which win over built-in defaults.
    pub fn from_cli(cli: &Cli, config: &Config) -> Result<Self> {
        let outline_path = match (&cli.file, &config.outline) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) => path.clone(),
            (None, None) => OutlineStore::default_path()?,
        };

        let timezone = config
            .timezone
            .as_deref()
            .map(|name| {
                name.parse::<chrono_tz::Tz>()
                    .map_err(|_| CommandError::Config(format!("Unknown timezone '{name}'")))
            })
            .transpose()?;

        let no_color_env = env::var("NO_COLOR").is_ok_and(|v| !v.is_empty());
        let use_colors = !cli.no_color && !no_color_env && config.output.color.unwrap_or(true);

        let now = cli.now.unwrap_or_else(Utc::now);

        Ok(Self {
            json_output: cli.json,
            use_colors,
            quiet: cli.quiet,
            verbose: cli.verbose,
            outline_path,
            eval: eval_context(now, timezone),
            pinned_now: cli.now,
            timezone,
            limit: config.search.limit.unwrap_or(DEFAULT_LIMIT),
            strict: config.search.strict.unwrap_or(false),
        })
    }

    /// Evaluation context for `now`, with the configured timezone's offset at
    /// that instant.
    pub fn eval_at(&self, now: DateTime<Utc>) -> EvalContext {
        eval_context(now, self.timezone)
    }

    /// Evaluation context for the pinned instant, or for the current time when
    /// `--now` was not given. Long-running sessions call this per query.
    pub fn current_eval(&self) -> EvalContext {
        self.eval_at(self.pinned_now.unwrap_or_else(Utc::now))
    }

    /// Loads the outline this invocation queries.
    pub fn load_outline(&self) -> Result<Outline> {
        tracing::debug!(path = %self.outline_path.display(), "loading outline");
        Ok(OutlineStore::with_path(&self.outline_path).load()?)
    }
}

fn eval_context(now: DateTime<Utc>, timezone: Option<chrono_tz::Tz>) -> EvalContext {
    let eval = EvalContext::new(now);
    match timezone {
        Some(tz) => eval.with_offset(tz.offset_from_utc_datetime(&now.naive_utc()).fix()),
        None => eval,
    }
}
