//! Native PTY implementation using portable-pty.

use std::io::{Read, Write};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty};
use tracing::{debug, warn};

use super::PtySize;
use crate::error::ShellScribeError;
use crate::Result;

/// Get the default shell for the current platform.
pub fn default_shell() -> String {
    #[cfg(unix)]
    {
        std::env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/bin/sh".to_string())
    }
    #[cfg(windows)]
    {
        "powershell.exe".to_string()
    }
}

/// Allocates pseudo-terminals and spawns shells on them.
pub struct PtyProcessManager {
    pty_system: Box<dyn portable_pty::PtySystem + Send>,
}

impl PtyProcessManager {
    /// Create a manager backed by the platform's native PTY system.
    pub fn new() -> Self {
        Self {
            pty_system: native_pty_system(),
        }
    }

    /// Allocate a PTY pair and spawn `shell` with its stdio on the slave.
    ///
    /// On unix the child runs in a new session (`setsid`) with the slave
    /// as its controlling terminal, so it can be signalled as a unit. The
    /// parent's copy of the slave is closed once the child holds it, so
    /// master reads report EOF when the shell exits.
    pub fn open_session(&self, shell: &str, args: &[String], size: PtySize) -> Result<PtySession> {
        let pair = self.pty_system.openpty(size.into()).map_err(|e| {
            ShellScribeError::Pty(format!("failed to allocate pseudo-terminal: {e}"))
        })?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.args(args);
        // portable-pty defaults to $HOME; keep the caller's directory.
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ShellScribeError::Pty(format!("failed to spawn '{shell}': {e}")))?;
        drop(pair.slave);

        let pid = child.process_id();
        debug!(shell, ?pid, rows = size.rows, cols = size.cols, "shell spawned");

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ShellScribeError::Pty(e.to_string()))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ShellScribeError::Pty(e.to_string()))?;

        Ok(PtySession {
            pid,
            master: Some(pair.master),
            child,
            reader: Some(reader),
            writer: Some(writer),
            terminated: false,
        })
    }
}

impl Default for PtyProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A live shell attached to a PTY.
///
/// Owns the master side and the child handle. [`PtySession::shutdown`]
/// terminates the child and closes the master; dropping the session
/// does the same.
pub struct PtySession {
    pid: Option<u32>,
    master: Option<Box<dyn MasterPty + Send>>,
    child: Box<dyn Child + Send + Sync>,
    reader: Option<Box<dyn Read + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    terminated: bool,
}

impl PtySession {
    /// Process ID of the shell, if the platform reports one.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the master reader (can only be called once).
    pub fn take_reader(&mut self) -> Result<Box<dyn Read + Send>> {
        self.reader
            .take()
            .ok_or_else(|| ShellScribeError::Pty("PTY reader already taken".into()))
    }

    /// Take the master writer (can only be called once).
    pub fn take_writer(&mut self) -> Result<Box<dyn Write + Send>> {
        self.writer
            .take()
            .ok_or_else(|| ShellScribeError::Pty("PTY writer already taken".into()))
    }

    /// Terminate the shell and close the master side.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;

        let result = match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(?status, "shell already exited");
                Ok(())
            }
            _ => self
                .child
                .kill()
                .and_then(|()| self.child.wait().map(|status| debug!(?status, "shell terminated")))
                .map_err(ShellScribeError::Io),
        };

        self.writer = None;
        self.reader = None;
        self.master = None;

        result
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("failed to terminate shell: {}", e);
        }
    }
}
