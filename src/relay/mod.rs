//! Bidirectional relaying between the user's terminal and the shell.
//!
//! The [`OutputRelay`] consumes PTY output chunks, echoes them verbatim and
//! records completed lines. The [`InputRelay`] forwards user lines to the
//! shell and records commands. Both share one [`SessionLogger`].

mod input;
mod output;

pub use input::{InputOutcome, InputRelay, DEFAULT_EXIT_TOKEN};
pub use output::OutputRelay;

use tracing::error;

use crate::error::ShellScribeError;
use crate::transcript::SessionLogger;

/// Push a relay failure onto the transcript's error path.
///
/// Failures here never stop a relay; if even the error record cannot be
/// written, it goes to the diagnostic log instead.
pub(crate) fn record_failure(logger: &SessionLogger, err: &ShellScribeError) {
    if let Err(nested) = logger.log_error(&err.to_string()) {
        error!("could not record relay error ({}): {}", err, nested);
    }
}
