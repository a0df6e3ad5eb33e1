//! External tool invocation.
//!
//! The packager shells out to two tools: the C compiler driver (for host
//! triplet introspection) and `pkg-config`. Both go through
//! [`CommandExecutor`] so tests can substitute canned outputs, and so any
//! environment override is scoped to the child process rather than the
//! packager's own environment.

use crate::error::{PackagerError, Result};
use std::process::{Command, Output};

/// A single external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to run.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Environment variables set on the child process only.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Create an invocation with no arguments or environment overrides.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable for the child process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs the invocation and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use glib_packager::command::{CommandExecutor, Invocation, SystemCommandExecutor};
    ///
    /// let output = SystemCommandExecutor.run(&Invocation::new("cc").arg("-dumpmachine"))?;
    /// assert!(output.status.success());
    /// # Ok::<(), glib_packager::error::PackagerError>(())
    /// ```
    fn run(&self, invocation: &Invocation) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        log::debug!("running {} {}", invocation.program, invocation.args.join(" "));
        Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|e| PackagerError::DependencyQuery {
                tool: invocation.program.clone(),
                message: e.to_string(),
            })
    }
}

/// Run `invocation` and return its trimmed stdout, failing on a non-zero exit.
///
/// # Errors
///
/// Returns [`PackagerError::DependencyQuery`] when the tool cannot be
/// spawned, exits unsuccessfully, or writes non-UTF-8 output.
pub fn run_for_stdout(executor: &dyn CommandExecutor, invocation: &Invocation) -> Result<String> {
    let output = executor.run(invocation)?;
    if !output.status.success() {
        return Err(PackagerError::DependencyQuery {
            tool: invocation.program.clone(),
            message: stderr_message(&output),
        });
    }
    String::from_utf8(output.stdout)
        .map(|stdout| stdout.trim().to_owned())
        .map_err(|e| PackagerError::DependencyQuery {
            tool: invocation.program.clone(),
            message: format!("non-UTF-8 output: {e}"),
        })
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}
