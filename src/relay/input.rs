//! User input relay.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::record_failure;
use crate::error::ShellScribeError;
use crate::transcript::SessionLogger;
use crate::Result;

/// Token that ends the session when typed on its own line.
pub const DEFAULT_EXIT_TOKEN: &str = "exitt";

/// Record written when user input reaches end of stream.
const EOF_MARKER: &str = "EOF received";

/// Why the input relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The user typed the exit token.
    ExitToken,
    /// User input reached end of stream.
    EndOfInput,
}

/// Forwards user lines to the shell and records commands.
pub struct InputRelay<R> {
    input: R,
    logger: Arc<SessionLogger>,
    pty_tx: mpsc::Sender<Vec<u8>>,
    exit_token: String,
}

impl<R: AsyncBufRead + Unpin> InputRelay<R> {
    /// Create a relay reading lines from `input` and sending them to the
    /// PTY writer through `pty_tx`.
    pub fn new(input: R, logger: Arc<SessionLogger>, pty_tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            input,
            logger,
            pty_tx,
            exit_token: DEFAULT_EXIT_TOKEN.to_string(),
        }
    }

    /// Use a different exit token (matched trimmed, case-insensitively).
    pub fn with_exit_token(mut self, token: impl AsRef<str>) -> Self {
        self.exit_token = token.as_ref().trim().to_lowercase();
        self
    }

    /// Relay lines until the exit token or end of input.
    ///
    /// Per-line failures are recorded and the loop continues. A failure
    /// to read user input at all is returned to the caller.
    pub async fn run(mut self) -> Result<InputOutcome> {
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let n = self.input.read_until(b'\n', &mut raw).await?;
            if n == 0 {
                debug!("input relay: end of input");
                if let Err(e) = self.logger.log(EOF_MARKER) {
                    record_failure(&self.logger, &e);
                }
                return Ok(InputOutcome::EndOfInput);
            }

            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            match self.handle_line(line).await {
                Ok(true) => {
                    info!("exit token received");
                    return Ok(InputOutcome::ExitToken);
                }
                Ok(false) => {}
                Err(e) => record_failure(&self.logger, &e),
            }
        }
    }

    /// Record and forward one line. Returns `true` for the exit token.
    async fn handle_line(&self, line: &str) -> Result<bool> {
        let trimmed = line.trim();
        let is_exit = trimmed.to_lowercase() == self.exit_token;

        let logged = if is_exit {
            // Session boundary; the filter drops the empty record.
            self.logger.log("")
        } else if !trimmed.is_empty() {
            self.logger.log_command(line)
        } else {
            Ok(())
        };

        let forwarded = self
            .pty_tx
            .send(format!("{line}\n").into_bytes())
            .await
            .map_err(|_| ShellScribeError::ChannelClosed);

        if is_exit {
            for err in [logged.err(), forwarded.err()].into_iter().flatten() {
                record_failure(&self.logger, &err);
            }
            return Ok(true);
        }

        if let Err(e) = logged {
            record_failure(&self.logger, &e);
        }
        forwarded?;
        Ok(false)
    }
}
