//! Makefile variable queries.
//!
//! Fuzzing build systems expose their output location through Makefile
//! variables (e.g. `BUILDDIR`). The build's Makefile is expected to carry
//! a `print-%` rule that echoes the variable's value, which lets the
//! packager resolve the artifact directory without duplicating build
//! configuration.

use crate::error::{PackagerError, Result};
use crate::exec::{CommandRunner, run_checked};
use log::debug;

/// The build tool queried for variable values.
const MAKE_TOOL: &str = "make";

/// Query the value of a Makefile variable via `make print-<name>`.
///
/// The value is the last non-empty line of the tool's stdout, so any
/// recursive-make chatter preceding it is ignored.
///
/// # Errors
///
/// Returns [`PackagerError::CommandFailed`] when the tool exits non-zero,
/// or [`PackagerError::Config`] when its output contains no value.
pub fn query_make_var(runner: &dyn CommandRunner, name: &str) -> Result<String> {
    let target = format!("print-{name}");
    debug!("running: {MAKE_TOOL} {target}");
    let output = run_checked(runner, MAKE_TOOL, &[target.as_str()], None)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned);

    value.ok_or_else(|| PackagerError::Config {
        reason: format!("`{MAKE_TOOL} {target}` produced no value for {name}"),
    })
}
