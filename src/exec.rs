//! External command execution.
//!
//! Every external tool invocation in the pipeline goes through the
//! [`CommandRunner`] trait so orchestration logic can be tested with stub
//! runners that record invocations and return canned results, without
//! spawning real subprocesses.

use crate::error::{PackagerError, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Abstraction for running external commands.
///
/// Arguments are passed to the operating system verbatim, never through a
/// shell, so tokens such as `$ORIGIN` reach the invoked tool unexpanded.
pub trait CommandRunner {
    /// Runs a command with arguments, optionally in a working directory,
    /// and returns the captured output.
    ///
    /// A non-zero exit is not an error at this level; callers that require
    /// success use [`run_checked`].
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning the command.
    fn run(&self, command: &str, args: &[&str], working_dir: Option<&Path>) -> Result<Output>;
}

/// Executes commands on the host system, one OS process per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &str, args: &[&str], working_dir: Option<&Path>) -> Result<Output> {
        let mut cmd = Command::new(command);
        cmd.args(args);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.output().map_err(PackagerError::from)
    }
}

/// Runs a command and converts a non-zero exit into a structured failure.
///
/// The returned [`PackagerError::CommandFailed`] carries the tool's stdout
/// and stderr verbatim. There is no retry: a failing external tool call
/// fails the run.
///
/// # Errors
///
/// Returns [`PackagerError::CommandFailed`] on a non-zero exit, or any
/// spawn error from the underlying runner.
pub fn run_checked(
    runner: &dyn CommandRunner,
    command: &str,
    args: &[&str],
    working_dir: Option<&Path>,
) -> Result<Output> {
    let output = runner.run(command, args, working_dir)?;
    if !output.status.success() {
        return Err(PackagerError::CommandFailed {
            command: render_command(command, args),
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output)
}

/// Render a command and its arguments for error messages.
fn render_command(command: &str, args: &[&str]) -> String {
    let mut rendered = command.to_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}
