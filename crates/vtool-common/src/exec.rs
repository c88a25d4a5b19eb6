//! External program execution.
//!
//! Programs are started directly with an explicit argument vector, never
//! through `/bin/sh -c`, so nothing in an argument is ever interpreted by a
//! shell. Every invocation captures stdout and stderr, checks the exit status
//! and is bounded by a timeout.
//!
//! # Example
//!
//! ```ignore
//! use vtool_common::exec::{self, CommandLine, SystemRunner};
//!
//! let runner = SystemRunner::new(Duration::from_secs(10));
//! let cmd = CommandLine::new("/sbin/ip").args(["-o", "-4", "addr", "show", "dev", "eth0"]);
//! let result = runner.run(&cmd).await?;
//! ```

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{VtoolError, VtoolResult};

/// Default timeout applied to external programs.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program path or name resolved through `PATH`.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl CommandLine {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of an external program execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// The exit code of the program (0 = success, -1 = killed by signal).
    pub exit_code: i32,
    /// Captured stdout, trailing whitespace removed.
    pub stdout: String,
    /// Captured stderr, trailing whitespace removed.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the program succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Converts a non-zero exit into [`VtoolError::CommandFailed`].
    pub fn check(self, cmd: &CommandLine) -> VtoolResult<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(VtoolError::CommandFailed {
                command: cmd.to_string(),
                exit_code: self.exit_code,
                output: self.combined_output(),
            })
        }
    }
}

/// Executes external programs.
///
/// A non-zero exit is not an error at this level; it is reported through
/// [`ExecResult::exit_code`]. Errors are reserved for programs that could not
/// be started or did not finish in time.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `cmd` to completion and captures its output.
    async fn run(&self, cmd: &CommandLine) -> VtoolResult<ExecResult>;
}

/// Runs programs on the host with a per-invocation timeout.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Creates a runner that kills programs running longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &CommandLine) -> VtoolResult<ExecResult> {
        tracing::debug!(command = %cmd, "Executing command");

        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        // Dropping the output future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(output) => output.map_err(|e| VtoolError::CommandSpawn {
                command: cmd.to_string(),
                source: e,
            })?,
            Err(_) => {
                tracing::warn!(command = %cmd, timeout = ?self.timeout, "Command timed out");
                return Err(VtoolError::CommandTimeout {
                    command: cmd.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let result = ExecResult {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        };

        if result.success() {
            tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
        } else {
            tracing::warn!(
                command = %cmd,
                exit_code = exit_code,
                stderr = %result.stderr,
                "Command failed"
            );
        }

        Ok(result)
    }
}

/// Runs a command and fails on non-zero exit, returning stdout on success.
pub async fn run_checked<R>(runner: &R, cmd: &CommandLine) -> VtoolResult<String>
where
    R: CommandRunner + ?Sized,
{
    runner.run(cmd).await?.check(cmd)
}
