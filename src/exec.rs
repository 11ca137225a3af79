//! External command invocation behind an injectable [`Executor`] trait.

use std::process::{Command, Output};

use crate::error::CommandError;

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Captured standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Render a program and its arguments as a single display string.
///
/// Used for `$ command` echo lines and for error messages, so the operator
/// can see exactly what was run.
pub fn render(program: &str, args: &[&str]) -> String {
    let mut out = String::from(program);
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

/// Abstraction over process invocation, injectable for testing.
pub trait Executor {
    /// Run a command and return its output. Fails if the command exits
    /// non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError>;

    /// Run a command, allowing failure (returns the result without bailing).
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] that runs real processes on the local system.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn output(program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(ExecResult::from(output))
    }
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
        let result = Self::output(program, args)?;
        if result.success {
            Ok(result)
        } else {
            Err(CommandError::Failed {
                command: render(program, args),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            })
        }
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
        Self::output(program, args)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
