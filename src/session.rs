//! Session controller: wires the PTY, the relays and the transcript.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ShellScribeError;
use crate::pty::{AsyncPtyReader, AsyncPtyWriter, PtyProcessManager, PtySize, DEFAULT_READ_SIZE};
use crate::relay::{InputOutcome, InputRelay, OutputRelay, DEFAULT_EXIT_TOKEN};
use crate::transcript::{NoiseFilter, SessionLogger};
use crate::Result;

/// How long shutdown waits for the output side to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Capacity of the chunk channels between the PTY threads and the relays.
const CHANNEL_CAPACITY: usize = 64;

/// Printed to the display once the shell is gone.
const TERMINATED_NOTICE: &[u8] = b"\nShell terminated.\n";

/// Runs one recorded shell session from startup to cleanup.
pub struct SessionController {
    logger: Arc<SessionLogger>,
    shell: String,
    args: Vec<String>,
    size: PtySize,
    exit_token: String,
    read_size: usize,
}

impl SessionController {
    /// Create a controller that records into `logger` and runs `shell`.
    pub fn new(logger: Arc<SessionLogger>, shell: impl Into<String>) -> Self {
        Self {
            logger,
            shell: shell.into(),
            args: Vec::new(),
            size: PtySize::default(),
            exit_token: DEFAULT_EXIT_TOKEN.to_string(),
            read_size: DEFAULT_READ_SIZE,
        }
    }

    /// Build a controller from loaded configuration.
    ///
    /// Compiles the ignore patterns and opens the transcript.
    pub fn from_config(config: &Config) -> Result<Self> {
        let filter = NoiseFilter::new(config.ignore_patterns()?);
        let logger = SessionLogger::open(&config.transcript.path, filter, config.transcript.format)?;

        Ok(Self::new(Arc::new(logger), config.shell_program())
            .with_args(config.shell.args.clone())
            .with_size(PtySize::new(config.shell.rows, config.shell.cols))
            .with_exit_token(&config.transcript.exit_token))
    }

    /// Arguments passed to the shell.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Initial PTY size.
    pub fn with_size(mut self, size: PtySize) -> Self {
        self.size = size;
        self
    }

    /// Token that ends the session.
    pub fn with_exit_token(mut self, token: impl Into<String>) -> Self {
        self.exit_token = token.into();
        self
    }

    /// Size of each PTY read.
    pub fn with_read_size(mut self, size: usize) -> Self {
        self.read_size = size;
        self
    }

    /// The shared transcript logger.
    pub fn logger(&self) -> &Arc<SessionLogger> {
        &self.logger
    }

    /// Run against the process's own stdin and stdout.
    pub async fn run(&self) -> Result<InputOutcome> {
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Run a session reading user lines from `input` and echoing shell
    /// output to `display`.
    ///
    /// Cleanup (terminating the shell, closing the PTY) happens on every
    /// path out of the input relay. Startup and input failures are
    /// recorded as critical errors before being returned.
    pub async fn run_with<I, D>(&self, input: I, display: D) -> Result<InputOutcome>
    where
        I: AsyncBufRead + Unpin,
        D: AsyncWrite + Unpin + Send + 'static,
    {
        let manager = PtyProcessManager::new();
        let opened = manager
            .open_session(&self.shell, &self.args, self.size)
            .and_then(|mut session| {
                let reader = session.take_reader()?;
                let writer = session.take_writer()?;
                Ok((session, reader, writer))
            });
        let (mut session, reader, writer) = match opened {
            Ok(parts) => parts,
            Err(e) => {
                self.critical(&e);
                return Err(e);
            }
        };
        info!(shell = %self.shell, pid = ?session.pid(), "session started");

        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let reader_task = tokio::spawn(
            AsyncPtyReader::new(reader, out_tx)
                .with_buffer_size(self.read_size)
                .run(),
        );
        let relay_task = tokio::spawn(OutputRelay::new(Arc::clone(&self.logger), display).run(out_rx));
        let writer_task = tokio::spawn(AsyncPtyWriter::new(writer, in_rx).run());

        let outcome = InputRelay::new(input, Arc::clone(&self.logger), in_tx)
            .with_exit_token(&self.exit_token)
            .run()
            .await;

        match &outcome {
            Ok(reason) => info!(?reason, "input relay finished"),
            Err(e) => self.critical(e),
        }

        // The input relay owned the only sender; the writer drains and exits.
        let writer = match tokio::time::timeout(DRAIN_TIMEOUT, writer_task).await {
            Ok(Ok(writer)) => writer,
            Ok(Err(e)) => {
                warn!("PTY writer task failed: {}", e);
                None
            }
            Err(_) => {
                warn!("PTY writer did not finish in time");
                None
            }
        };

        // kill and wait block, so they run off the async worker.
        match tokio::task::spawn_blocking(move || session.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("shell termination failed: {}", e),
            Err(e) => warn!("shell termination task failed: {}", e),
        }
        drop(writer);

        if tokio::time::timeout(DRAIN_TIMEOUT, reader_task).await.is_err() {
            warn!("PTY reader still blocked after shutdown");
        }
        match tokio::time::timeout(DRAIN_TIMEOUT, relay_task).await {
            Ok(Ok(mut display)) => {
                if let Err(e) = display.write_all(TERMINATED_NOTICE).await {
                    debug!("could not print termination notice: {}", e);
                }
                if let Err(e) = display.flush().await {
                    debug!("could not flush display: {}", e);
                }
            }
            Ok(Err(e)) => warn!("output relay task failed: {}", e),
            Err(_) => warn!("output relay did not finish in time"),
        }

        info!("session closed");
        outcome
    }

    fn critical(&self, err: &ShellScribeError) {
        error!("critical error: {}", err);
        if let Err(e) = self.logger.log_error(&format!("Critical error: {err}")) {
            error!("could not record critical error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::RecordFormat;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;

    /// A display whose terminal has gone away.
    struct ClosedDisplay;

    impl AsyncWrite for ClosedDisplay {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn logger(dir: &TempDir) -> Arc<SessionLogger> {
        Arc::new(
            SessionLogger::open(
                dir.path().join("log.txt"),
                NoiseFilter::default(),
                RecordFormat::Plain,
            )
            .unwrap(),
        )
    }

    fn transcript(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join("log.txt")).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawn_failure_is_recorded() {
        let dir = TempDir::new().unwrap();
        let controller = SessionController::new(logger(&dir), "/definitely/not/a/shell");

        let input = tokio_test::io::Builder::new().build();
        let result = controller.run_with(BufReader::new(input), tokio::io::sink()).await;

        assert!(matches!(result, Err(ShellScribeError::Pty(_))));
        assert!(transcript(&dir).starts_with("Critical error: PTY error"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_session_with_exit_token() {
        let dir = TempDir::new().unwrap();
        let controller = SessionController::new(logger(&dir), "/bin/sh");

        let input = tokio_test::io::Builder::new()
            .read(b"echo scribe-$((40+2))\n")
            .wait(Duration::from_millis(800))
            .read(b"EXITT\n")
            .build();
        let outcome = controller
            .run_with(BufReader::new(input), tokio::io::sink())
            .await
            .unwrap();

        assert_eq!(outcome, InputOutcome::ExitToken);
        let log = transcript(&dir);
        assert!(log.contains("Command: echo scribe-$((40+2))\n"), "{log}");
        assert!(log.lines().any(|l| l == "scribe-42"), "{log}");
        assert!(!log.contains('\x1b'));
        assert!(!log.lines().any(|l| l.trim().is_empty()));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_end_of_input_shuts_down() {
        let dir = TempDir::new().unwrap();
        let controller = SessionController::new(logger(&dir), "/bin/sh");

        let input = tokio_test::io::Builder::new().build();
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            controller.run_with(BufReader::new(input), tokio::io::sink()),
        )
        .await
        .expect("session did not shut down")
        .unwrap();

        assert_eq!(outcome, InputOutcome::EndOfInput);
        assert!(transcript(&dir).ends_with("EOF received\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_closes_on_current_thread_runtime() {
        let dir = TempDir::new().unwrap();
        let controller = SessionController::new(logger(&dir), "/bin/sh");

        let input = tokio_test::io::Builder::new()
            .read(b"echo current-thread\n")
            .wait(Duration::from_millis(300))
            .build();
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            controller.run_with(BufReader::new(input), tokio::io::sink()),
        )
        .await
        .expect("session did not shut down")
        .unwrap();

        assert_eq!(outcome, InputOutcome::EndOfInput);
        assert!(transcript(&dir).contains("Command: echo current-thread\n"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_display_does_not_fail_session() {
        let dir = TempDir::new().unwrap();
        let controller = SessionController::new(logger(&dir), "/bin/sh");

        let input = tokio_test::io::Builder::new()
            .read(b"echo unseen\n")
            .wait(Duration::from_millis(300))
            .read(b"exitt\n")
            .build();
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            controller.run_with(BufReader::new(input), ClosedDisplay),
        )
        .await
        .expect("session did not shut down")
        .unwrap();

        assert_eq!(outcome, InputOutcome::ExitToken);
        assert!(transcript(&dir).contains("Command: echo unseen\n"));
    }
}
