use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::load_config;
use commands::{CommandContext, CommandError};
use outline_query::StoreError;
use output::helpers::format_syntax_error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&error_json).unwrap_or_else(|_| e.to_string())
                );
            } else if let CommandError::Syntax { query, source } = &e {
                let use_colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
                eprint!("{}", format_syntax_error(query, source, use_colors));
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Logs go to stderr so stdout stays clean for tables and JSON.
///
/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    // Completions work without a config or outline.
    if let Commands::Completions { shell } = &cli.command {
        return commands::completions::execute(shell).map_err(CommandError::Io);
    }

    let config = load_config()?;
    let ctx = CommandContext::from_cli(cli, &config)?;

    match &cli.command {
        Commands::Search {
            query,
            limit,
            all,
            strict,
        } => {
            let opts = commands::search::SearchOptions {
                query: query.clone(),
                limit: *limit,
                all: *all,
                strict: *strict,
            };
            commands::search::execute(&ctx, &opts)
        }
        Commands::Quick { limit } => commands::quick::execute(&ctx, *limit),
        Commands::Explain { query, node } => commands::explain::execute(&ctx, query, node),
        Commands::Parse { query, tokens } => commands::parse::execute(&ctx, query, *tokens),
        Commands::Saved { limit } => commands::saved::execute(&ctx, *limit),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config::execute_show(&ctx, &config),
            Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
            Some(ConfigCommands::Init { force }) => commands::config::execute_init(&ctx, *force),
        },
        Commands::Completions { .. } => Ok(()),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Syntax { .. } => "SYNTAX_ERROR",
        CommandError::Store(_) => "OUTLINE_ERROR",
        CommandError::NodeNotFound(_) => "NODE_NOT_FOUND",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Prompt(_) => "PROMPT_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    ExitCode::from(exit_status(e))
}

fn exit_status(e: &CommandError) -> u8 {
    match e {
        CommandError::Syntax { .. } => 1,
        CommandError::Json(_) => 1,
        CommandError::NodeNotFound(_) => 2,
        CommandError::Store(StoreError::NoDataDir) => 5,
        CommandError::Store(_) => 3,
        CommandError::Prompt(_) => 3,
        CommandError::Io(_) => 3,
        CommandError::Config(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_query::filter::parse_query;
    use std::path::PathBuf;

    fn syntax_error() -> CommandError {
        let source = parse_query("d:>").unwrap_err();
        CommandError::syntax("d:>", source)
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(error_code(&syntax_error()), "SYNTAX_ERROR");
        assert_eq!(
            error_code(&CommandError::NodeNotFound("x".into())),
            "NODE_NOT_FOUND"
        );
        assert_eq!(
            error_code(&CommandError::Store(StoreError::NoDataDir)),
            "OUTLINE_ERROR"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_status(&syntax_error()), 1);
        assert_eq!(exit_status(&CommandError::NodeNotFound("x".into())), 2);
        let read_error = StoreError::ReadError {
            path: PathBuf::from("/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(exit_status(&CommandError::Store(read_error)), 3);
        assert_eq!(exit_status(&CommandError::Store(StoreError::NoDataDir)), 5);
        assert_eq!(exit_status(&CommandError::Config("bad".into())), 5);
    }

    #[test]
    fn test_syntax_error_message_names_fragment() {
        let message = syntax_error().to_string();
        assert!(message.starts_with("syntax error: "));
        assert!(message.contains("d:>"));
    }
}
