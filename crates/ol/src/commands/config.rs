//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/ol/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# ol - outline query CLI configuration

# Config schema version (do not modify)
version = 1

# Outline file to search (can also use --file or OL_OUTLINE)
# outline = "/home/me/notes/outline.json"

# IANA timezone used to decide what "today" is (default: UTC)
# timezone = "Europe/Berlin"

# Search preferences
[search]
# limit = 50                # Matches shown by default
# strict = false            # Fail on syntax errors instead of searching text

# Output preferences
[output]
# color = true              # Enable colors (respects NO_COLOR env)
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Outline file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<PathBuf>,

    /// IANA timezone name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            outline: None,
            timezone: None,
            search: SearchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Search configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default match limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Fail on syntax errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/ol/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    // Check for override env var first
    if let Ok(path) = env::var("OL_CONFIG") {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            return Ok(parent.to_path_buf());
        }
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("ol"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("ol"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("OL_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// A missing file yields the defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "loaded config");
    migrate_config(config)
}

fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    // Version 1 is the initial schema.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext, config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
            "effective": {
                "outline": ctx.outline_path.display().to_string(),
                "timezone_offset": ctx.eval.offset().to_string(),
                "limit": ctx.limit,
                "strict": ctx.strict,
                "color": ctx.use_colors,
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        println!("Effective settings:");
        println!("  outline: {}", ctx.outline_path.display());
        if let Some(ref tz) = config.timezone {
            println!("  timezone: {} ({})", tz, ctx.eval.offset());
        } else {
            println!("  timezone: UTC");
        }
        println!("  search.limit: {}", ctx.limit);
        println!("  search.strict: {}", ctx.strict);
        println!("  output.color: {}", ctx.use_colors);

        if !path.exists() {
            println!("\n(No config file exists. Run 'ol config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command, writing the commented default config.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.outline.is_none());
        assert!(config.timezone.is_none());
        assert!(config.search.limit.is_none());
        assert!(config.output.color.is_none());
    }

    #[test]
    fn test_default_config_file_parses() {
        // Everything in the template is commented out.
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.outline.is_none());
        assert!(config.search.strict.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            version: CONFIG_VERSION,
            outline: Some(PathBuf::from("/tmp/outline.json")),
            timezone: Some("Europe/Berlin".to_string()),
            search: SearchConfig {
                limit: Some(20),
                strict: None,
            },
            output: OutputConfig { color: Some(true) },
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("timezone = \"Europe/Berlin\""));
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("limit = 20"));
        assert!(!toml_str.contains("strict"));
        assert!(toml_str.contains("color = true"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
version = 1
outline = "/data/outline.json"
timezone = "America/New_York"

[search]
limit = 5
strict = true

[output]
color = false
"#;
        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.outline, Some(PathBuf::from("/data/outline.json")));
        assert_eq!(config.timezone.as_deref(), Some("America/New_York"));
        assert_eq!(config.search.limit, Some(5));
        assert_eq!(config.search.strict, Some(true));
        assert_eq!(config.output.color, Some(false));
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config = parse_config("").unwrap();
        // Missing version defaults to current version
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.outline.is_none());
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = parse_config("[search\nlimit = ");
        assert!(matches!(result, Err(CommandError::Config(_))));
    }

    #[test]
    fn test_config_wrong_type() {
        let result = parse_config("[search]\nlimit = \"many\"\n");
        assert!(matches!(result, Err(CommandError::Config(_))));
    }

    #[test]
    fn test_migrate_config_preserves_data() {
        let config = Config {
            version: 0,
            outline: Some(PathBuf::from("/tmp/o.json")),
            timezone: None,
            search: SearchConfig {
                limit: Some(3),
                strict: Some(true),
            },
            output: OutputConfig { color: Some(false) },
        };

        let migrated = migrate_config(config).unwrap();
        assert_eq!(migrated.version, CONFIG_VERSION);
        assert_eq!(migrated.outline, Some(PathBuf::from("/tmp/o.json")));
        assert_eq!(migrated.search.limit, Some(3));
        assert_eq!(migrated.output.color, Some(false));
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");

        let original = env::var("OL_CONFIG").ok();
        env::set_var("OL_CONFIG", &config_path);

        let path = get_config_path();
        let loaded = load_config();

        match original {
            Some(val) => env::set_var("OL_CONFIG", val),
            None => env::remove_var("OL_CONFIG"),
        }

        assert_eq!(path.unwrap(), config_path);
        // Missing file falls back to defaults.
        assert_eq!(loaded.unwrap().version, CONFIG_VERSION);
    }

    #[test]
    #[serial]
    fn test_config_dir_uses_xdg_config_home() {
        let original_config = env::var("OL_CONFIG").ok();
        let original_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::remove_var("OL_CONFIG");
        env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-test");

        let path = get_config_path();

        if let Some(val) = original_config {
            env::set_var("OL_CONFIG", val);
        }
        match original_xdg {
            Some(val) => env::set_var("XDG_CONFIG_HOME", val),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(
            path.unwrap(),
            PathBuf::from("/tmp/xdg-test/ol/config.toml")
        );
    }

    #[test]
    #[serial]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[search]\nlimit = 9\n").unwrap();

        let original = env::var("OL_CONFIG").ok();
        env::set_var("OL_CONFIG", &config_path);

        let loaded = load_config();

        match original {
            Some(val) => env::set_var("OL_CONFIG", val),
            None => env::remove_var("OL_CONFIG"),
        }

        assert_eq!(loaded.unwrap().search.limit, Some(9));
    }
}
