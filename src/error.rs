//! Error types for shell-scribe.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for shell-scribe operations.
#[derive(Error, Debug)]
pub enum ShellScribeError {
    /// PTY allocation or shell spawn failed.
    #[error("PTY error: {0}")]
    Pty(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Appending a record to the transcript failed.
    #[error("failed to write transcript {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An ignore pattern is not a valid regular expression.
    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// The PTY writer is gone; input can no longer reach the shell.
    #[error("channel closed")]
    ChannelClosed,
}

/// Convenience Result type for shell-scribe operations.
pub type Result<T> = std::result::Result<T, ShellScribeError>;
