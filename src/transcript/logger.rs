//! Append-only session transcript.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::{debug, trace};

use super::{LogCategory, NoiseFilter, RecordFormat};
use crate::error::ShellScribeError;
use crate::output::Sanitizer;
use crate::Result;

/// Writes accepted, sanitized lines to the transcript file.
///
/// Shared by the output and input relays. Every record is appended and
/// synced while holding a single lock, so records from different relays
/// never interleave within a line.
#[derive(Debug)]
pub struct SessionLogger {
    path: PathBuf,
    filter: NoiseFilter,
    format: RecordFormat,
    file: Mutex<File>,
}

impl SessionLogger {
    /// Open (or create) the transcript in append mode.
    pub fn open(path: impl AsRef<Path>, filter: NoiseFilter, format: RecordFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ShellScribeError::LogWrite {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), ?format, "transcript opened");

        Ok(Self {
            path,
            filter,
            format,
            file: Mutex::new(file),
        })
    }

    /// Record free-form text.
    ///
    /// Ignored, blank and whitespace-only text is dropped without error.
    pub fn log(&self, text: &str) -> Result<()> {
        self.append(text, LogCategory::Info)
    }

    /// Record a user command as `Command: <cmd>`.
    pub fn log_command(&self, command: &str) -> Result<()> {
        if self.filter.should_ignore(command) {
            trace!("command ignored");
            return Ok(());
        }
        self.append(&format!("Command: {command}"), LogCategory::Command)
    }

    /// Record a line of shell output.
    pub fn log_output(&self, output: &str) -> Result<()> {
        self.append(output, LogCategory::Output)
    }

    /// Record a relay error.
    pub fn log_error(&self, error: &str) -> Result<()> {
        self.append(error, LogCategory::Error)
    }

    /// Path of the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The noise filter applied to every record.
    pub fn filter(&self) -> &NoiseFilter {
        &self.filter
    }

    fn append(&self, text: &str, category: LogCategory) -> Result<()> {
        if self.filter.should_ignore(text) {
            trace!(%category, "record ignored");
            return Ok(());
        }

        let cleaned = Sanitizer::sanitize(text);
        let now = Local::now();
        // Embedded newlines become separate records, never one broken record,
        // and each of them has to pass the filter on its own.
        let record: String = cleaned
            .split('\n')
            .filter(|line| !self.filter.should_ignore(line))
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.filter.should_ignore(line))
            .map(|line| self.format.render(now, category, line))
            .collect();
        if record.is_empty() {
            return Ok(());
        }

        let mut file = self.file.lock().map_err(|_| ShellScribeError::LockPoisoned)?;
        file.write_all(record.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|source| ShellScribeError::LogWrite {
                path: self.path.clone(),
                source,
            })?;

        trace!(%category, bytes = record.len(), "record appended");
        Ok(())
    }
}
