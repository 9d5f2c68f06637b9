//! Transcript record categories and on-disk formats.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What kind of text a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// Session markers and free-form messages.
    Info,
    /// A command typed by the user.
    Command,
    /// A line of shell output.
    Output,
    /// An error raised while relaying.
    Error,
}

impl LogCategory {
    /// Short uppercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Info => "INFO",
            LogCategory::Command => "CMD",
            LogCategory::Output => "OUT",
            LogCategory::Error => "ERR",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a record is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// The sanitized text only.
    #[default]
    Plain,
    /// `YYYY-MM-DD HH:MM:SS [CAT] text`.
    Annotated,
}

impl RecordFormat {
    /// Render one newline-terminated record.
    pub fn render(&self, at: DateTime<Local>, category: LogCategory, text: &str) -> String {
        match self {
            RecordFormat::Plain => format!("{text}\n"),
            RecordFormat::Annotated => {
                format!("{} [{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), category, text)
            }
        }
    }
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(RecordFormat::Plain),
            "annotated" => Ok(RecordFormat::Annotated),
            other => Err(format!("unknown record format: {other}")),
        }
    }
}
