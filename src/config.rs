//! Project configuration module.
//!
//! Handles loading and validating an optional `june.toml`. The file only
//! supplies defaults for the `generate` command; any flag given on the
//! command line wins over the file.
//!
//! ## Config File Location
//!
//! `june` looks for `june.toml` in the current directory. A different file
//! can be named with `--config`; in that case the file must exist.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output = "public/index.html"  # Where the generated page is written
//! untrusted = false             # Sanitize rendered HTML (same as --ugc)
//! # style = "theme.css"         # Stylesheet (embedded one when absent)
//! # template = "page.html"      # Page template (embedded one when absent)
//!
//! [logging]
//! level = "warn"                # error | warn | info | debug | trace
//! ```
//!
//! Unknown keys are rejected to catch typos early. Watch mode has no
//! settings of its own.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::RenderOptions;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "june.toml";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `june.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JuneConfig {
    /// Output file for `generate` when `--output` is not given.
    pub output: PathBuf,
    /// Treat the Markdown as untrusted and sanitize it.
    pub untrusted: bool,
    pub style: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for JuneConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("public/index.html"),
            untrusted: false,
            style: None,
            template: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Diagnostic logging settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl JuneConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation("output must not be empty".into()));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }

    /// The output path: the command-line value if given, else the configured one.
    pub fn output_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.unwrap_or_else(|| self.output.clone())
    }

    /// Combine command-line render flags with the configured defaults.
    ///
    /// Paths given on the command line replace configured ones; `untrusted`
    /// is on if either side turns it on.
    pub fn render_options(&self, cli: RenderOptions) -> RenderOptions {
        RenderOptions {
            untrusted: cli.untrusted || self.untrusted,
            style: cli.style.or_else(|| self.style.clone()),
            template: cli.template.or_else(|| self.template.clone()),
        }
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Parse the contents of a `june.toml` and validate them.
///
/// Keys missing from `content` take their default values through
/// `#[serde(default)]`, so an empty file yields [`JuneConfig::default`].
pub fn parse_config(content: &str) -> Result<JuneConfig, ConfigError> {
    let config: JuneConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration.
///
/// With an explicit `path` the file must exist. Without one, `june.toml` in
/// the working directory is used if present and stock defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<JuneConfig, ConfigError> {
    let path = match path {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => path,
        None if Path::new(CONFIG_FILE).exists() => Path::new(CONFIG_FILE),
        None => return Ok(JuneConfig::default()),
    };
    parse_config(&fs::read_to_string(path)?)
}

/// Returns a fully-commented stock `june.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# june Configuration
# ==================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# june reads ./june.toml, or the file passed with --config.
# Command-line flags always override these values.
# Unknown keys will cause an error.

# Where `june generate` writes the page when --output is not given.
# Missing directories are created.
output = "public/index.html"

# Treat the Markdown as untrusted (same as --ugc): scripts, event
# handlers and inline styles are stripped from the rendered HTML.
untrusted = false

# Stylesheet inlined into the page. Leave unset for the embedded one.
# A path that does not exist falls back to the embedded stylesheet.
# style = "theme.css"

# Page template with {{ title }}, {{ description }}, {{ lang }},
# {{ tags }}, {{ style }} and {{ content }} placeholders.
# Leave unset for the embedded template.
# template = "page.html"

# ---------------------------------------------------------------------------
# Diagnostics
# ---------------------------------------------------------------------------
[logging]
# One of: error, warn, info, debug, trace.
# The RUST_LOG environment variable overrides this.
level = "warn"
"##
}
