//! External process execution
//!
//! The setup phases shell out to a makefile and a shell script. Both run
//! through the [`ProcessRunner`] seam so the phase logic can be tested
//! without spawning anything.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Describes one external command invocation
///
/// Arguments are passed through verbatim; no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute (resolved via PATH)
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory, if different from the caller's
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Creates an invocation of the given program with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Appends one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends one path argument
    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Sets the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Capability for running external commands to completion
///
/// Standard streams are inherited from the invoking process, so tool
/// output lands on the user's terminal as it is produced. The call blocks
/// until the command exits; no timeout is applied.
pub trait ProcessRunner: Send + Sync {
    /// Runs the invocation and returns its exit code
    ///
    /// An error here means the command could not be started at all; a
    /// command that started and failed reports through the exit code.
    ///
    /// # Arguments
    /// * `invocation` - The command to run
    ///
    /// # Returns
    /// The command's exit code
    fn run(&self, invocation: &Invocation) -> Result<i32>;
}

/// Standard implementation of [`ProcessRunner`] over `std::process`
pub struct StandardProcessRunner;

impl ProcessRunner for StandardProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        debug!(
            "Executing process: {} {:?}",
            invocation.program, invocation.args
        );

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);

        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        // status() inherits stdio, streaming tool output to the terminal
        let status = command.status().with_context(|| {
            format!(
                "Failed to execute '{}'. Is it installed and on PATH?",
                invocation.program
            )
        })?;

        let exit_code = status.code().unwrap_or(-1);
        debug!(
            "Process '{}' exited with code {}",
            invocation.program, exit_code
        );

        Ok(exit_code)
    }
}
