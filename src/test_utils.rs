//! Shared test utilities: stub command runners and process-output helpers.

use crate::error::Result;
use crate::exec::CommandRunner;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a successful command `Output` with the given stdout text.
pub fn success_output_with_stdout(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g. "patchelf").
    pub command: &'static str,
    /// The exact arguments the command must be invoked with.
    pub args: Vec<String>,
    /// The working directory the command must be invoked in.
    pub working_dir: Option<PathBuf>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of [`CommandRunner`] for testing.
///
/// Consumes expected invocations in order, asserting the exact command,
/// arguments, and working directory, and returns the predefined results.
#[derive(Debug)]
pub struct StubRunner {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubRunner {
    /// Creates a new `StubRunner` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandRunner for StubRunner {
    fn run(&self, command: &str, args: &[&str], working_dir: Option<&Path>) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let call = expected.pop_front().expect("unexpected command invocation");

        assert_eq!(call.command, command);
        assert_eq!(call.args, args);
        assert_eq!(call.working_dir.as_deref(), working_dir);

        call.result
    }
}

/// A single invocation observed by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The command that was invoked.
    pub command: String,
    /// The arguments the command was invoked with.
    pub args: Vec<String>,
    /// The working directory the command was invoked in.
    pub working_dir: Option<PathBuf>,
}

/// A permissive [`CommandRunner`] stub that records every invocation and
/// always reports success.
///
/// Useful when a test asserts which commands ran (and which did not)
/// rather than scripting an exact sequence.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<RecordedCall>>,
}

impl RecordingRunner {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded invocations, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Returns the recorded invocations of a single command.
    pub fn calls_for(&self, command: &str) -> Vec<RecordedCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.command == command)
            .cloned()
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &str, args: &[&str], working_dir: Option<&Path>) -> Result<Output> {
        self.calls.borrow_mut().push(RecordedCall {
            command: command.to_owned(),
            args: args.iter().map(|&arg| arg.to_owned()).collect(),
            working_dir: working_dir.map(Path::to_path_buf),
        });
        Ok(success_output())
    }
}
