//! Shell output relay.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::record_failure;
use crate::output::{LineBuffer, Utf8Decoder};
use crate::transcript::SessionLogger;

/// Echoes PTY output to the display and records completed lines.
pub struct OutputRelay<D> {
    logger: Arc<SessionLogger>,
    display: D,
    decoder: Utf8Decoder,
    lines: LineBuffer,
}

impl<D: AsyncWrite + Unpin> OutputRelay<D> {
    /// Create a relay writing raw output to `display`.
    pub fn new(logger: Arc<SessionLogger>, display: D) -> Self {
        Self {
            logger,
            display,
            decoder: Utf8Decoder::new(),
            lines: LineBuffer::new(),
        }
    }

    /// Handle one chunk read from the PTY master.
    ///
    /// Malformed UTF-8 discards the chunk and the pending partial line.
    /// Otherwise the raw bytes are echoed unmodified and each completed,
    /// non-blank line goes to the transcript.
    pub async fn process_chunk(&mut self, chunk: &[u8]) {
        let text = match self.decoder.decode(chunk) {
            Ok(text) => text,
            Err(e) => {
                debug!("discarding buffered output: {}", e);
                self.lines.clear();
                return;
            }
        };

        if let Err(e) = self.echo(chunk).await {
            warn!("display write failed: {}", e);
        }

        for line in self.lines.push(&text) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Err(e) = self.logger.log_output(line) {
                record_failure(&self.logger, &e);
            }
        }
    }

    /// Relay chunks until the channel closes, then hand back the display.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Vec<u8>>) -> D {
        while let Some(chunk) = rx.recv().await {
            self.process_chunk(&chunk).await;
        }
        if !self.lines.pending().trim().is_empty() {
            debug!(
                bytes = self.lines.pending().len(),
                "output ended without newline; partial line not recorded"
            );
        }
        if self.decoder.has_pending() {
            debug!("output ended inside a multi-byte character");
        }
        debug!("output relay finished");
        self.display
    }

    async fn echo(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.display.write_all(chunk).await?;
        self.display.flush().await
    }
}
