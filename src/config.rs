//! Configuration management for shell-scribe.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::pty::default_shell;
use crate::relay::DEFAULT_EXIT_TOKEN;
use crate::transcript::{IgnorePatterns, RecordFormat, DEFAULT_PATTERNS};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell process settings.
    pub shell: ShellSection,
    /// Transcript settings.
    pub transcript: TranscriptSection,
    /// Noise filter settings.
    pub filter: FilterSection,
    /// Diagnostic logging settings.
    pub logging: LoggingSection,
}

/// Shell configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// Shell executable. `None` means `$SHELL`, then `/bin/sh`.
    pub program: Option<String>,
    /// Arguments passed to the shell.
    pub args: Vec<String>,
    /// PTY rows.
    pub rows: u16,
    /// PTY columns.
    pub cols: u16,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            rows: 24,
            cols: 80,
        }
    }
}

/// Transcript configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSection {
    /// Log file path.
    pub path: PathBuf,
    /// Line that ends the session.
    pub exit_token: String,
    /// Record format.
    pub format: RecordFormat,
}

impl Default for TranscriptSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("log.txt"),
            exit_token: DEFAULT_EXIT_TOKEN.to_string(),
            format: RecordFormat::Plain,
        }
    }
}

/// Noise filter configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Ignore patterns (regular expressions, matched anywhere).
    pub ignore_patterns: Vec<String>,
    /// Patterns appended after `ignore_patterns`.
    pub extra_patterns: Vec<String>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            ignore_patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            extra_patterns: Vec::new(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter directive (error, warn, info, debug, trace, or `target=level`).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "shell_scribe=warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(shell) = var("SHELL_SCRIBE_SHELL").filter(|s| !s.is_empty()) {
            self.shell.program = Some(shell);
        }

        if let Some(path) = var("SHELL_SCRIBE_LOG_FILE").filter(|s| !s.is_empty()) {
            self.transcript.path = PathBuf::from(path);
        }

        if let Some(token) = var("SHELL_SCRIBE_EXIT_TOKEN").filter(|s| !s.trim().is_empty()) {
            self.transcript.exit_token = token;
        }

        if let Some(level) = var("SHELL_SCRIBE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref shell) = args.shell {
            self.shell.program = Some(shell.clone());
        }

        if !args.shell_args.is_empty() {
            self.shell.args = args.shell_args.clone();
        }

        if let Some(ref path) = args.log_file {
            self.transcript.path = path.clone();
        }

        if let Some(ref token) = args.exit_token {
            self.transcript.exit_token = token.clone();
        }

        if let Some(format) = args.format {
            self.transcript.format = format;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transcript.exit_token.trim().is_empty() {
            return Err(ConfigError::Invalid("exit token must not be blank".into()));
        }
        if self.shell.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("shell program must not be blank".into()));
        }
        Ok(())
    }

    /// The shell to spawn.
    pub fn shell_program(&self) -> String {
        self.shell.program.clone().unwrap_or_else(default_shell)
    }

    /// Compile the configured ignore patterns.
    pub fn ignore_patterns(&self) -> crate::Result<IgnorePatterns> {
        IgnorePatterns::new(
            self.filter
                .ignore_patterns
                .iter()
                .chain(&self.filter.extra_patterns),
        )
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A setting has an unusable value.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::ShellScribeError {
    fn from(e: ConfigError) -> Self {
        crate::ShellScribeError::Config(e.to_string())
    }
}
