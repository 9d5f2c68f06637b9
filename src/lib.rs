//! # shell-scribe
//!
//! Transparent shell session recorder.
//!
//! Spawns a shell behind a pseudo-terminal, relays keyboard input and
//! shell output untouched, and writes a sanitized transcript of the
//! session: escape sequences stripped, prompts and other terminal chrome
//! filtered out, one record per line.
//!
//! ## Features
//!
//! - **PTY relay**: the shell believes it is attached to a real terminal
//! - **Sanitized transcript**: ANSI/OSC/CSI sequences and control
//!   characters never reach the log
//! - **Configurable noise filter**: prompt shapes are data, not code
//! - **Serialized writes**: output and input relays share one logger
//!   without corrupting line boundaries
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use shell_scribe::{NoiseFilter, RecordFormat, SessionController, SessionLogger};
//!
//! #[tokio::main]
//! async fn main() -> shell_scribe::Result<()> {
//!     shell_scribe::logging::try_init().ok();
//!
//!     let logger = SessionLogger::open("log.txt", NoiseFilter::default(), RecordFormat::Plain)?;
//!     let controller = SessionController::new(Arc::new(logger), "/bin/bash");
//!
//!     let outcome = controller.run().await?;
//!     println!("session ended: {:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod pty;
pub mod relay;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, ShellScribeError};
pub use output::{LineBuffer, Sanitizer};
pub use pty::{PtyProcessManager, PtySession, PtySize};
pub use relay::{InputOutcome, InputRelay, OutputRelay};
pub use session::SessionController;
pub use transcript::{IgnorePatterns, LogCategory, NoiseFilter, RecordFormat, SessionLogger};
