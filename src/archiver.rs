//! Compressed archive creation via the external `zip` tool.
//!
//! Archives are always produced with the working directory set to the
//! tree being archived and a relative source path, so member paths are
//! relative. Absolute member paths would break extraction on any other
//! machine.

use crate::error::{PackagerError, Result};
use crate::exec::{CommandRunner, run_checked};
use log::debug;
use std::path::Path;

/// The external compression tool.
const ARCHIVE_TOOL: &str = "zip";

/// Produces zip archives of directory trees.
pub struct Archiver<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Archiver<'a> {
    /// Create an archiver that invokes the compression tool through
    /// `runner`.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Recursively archive `source` (a path relative to `working_dir`)
    /// into `destination`.
    ///
    /// The tool runs with `working_dir` as its current directory so the
    /// archive members are stored relative to it. `destination` may live
    /// outside the working directory and should be absolute when it does.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Archive`] when the compression tool exits
    /// non-zero.
    pub fn archive(&self, working_dir: &Path, source: &str, destination: &Path) -> Result<()> {
        debug!(
            "running: \"{ARCHIVE_TOOL} -r {} {source}\" from {}",
            destination.display(),
            working_dir.display()
        );
        let destination_arg = destination.to_string_lossy();
        run_checked(
            self.runner,
            ARCHIVE_TOOL,
            &["-r", destination_arg.as_ref(), source],
            Some(working_dir),
        )
        .map_err(|source| PackagerError::Archive {
            destination: destination.to_path_buf(),
            source: Box::new(source),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubRunner, failure_output, success_output};
    use std::path::PathBuf;

    #[test]
    fn archives_relative_to_working_directory() {
        let runner = StubRunner::new(vec![ExpectedCall {
            command: "zip",
            args: vec![
                "-r".to_owned(),
                "/out/fuzztargets.zip".to_owned(),
                ".".to_owned(),
            ],
            working_dir: Some(PathBuf::from("/tmp/fdfuzz-abc123")),
            result: Ok(success_output()),
        }]);

        let archiver = Archiver::new(&runner);
        archiver
            .archive(
                Path::new("/tmp/fdfuzz-abc123"),
                ".",
                Path::new("/out/fuzztargets.zip"),
            )
            .expect("archive should succeed");
        runner.assert_finished();
    }

    #[test]
    fn non_zero_exit_becomes_archive_error() {
        let runner = StubRunner::new(vec![ExpectedCall {
            command: "zip",
            args: vec![
                "-r".to_owned(),
                "/out/fuzztargets.zip".to_owned(),
                ".".to_owned(),
            ],
            working_dir: Some(PathBuf::from("/tmp/fdfuzz-abc123")),
            result: Ok(failure_output("zip I/O error")),
        }]);

        let archiver = Archiver::new(&runner);
        let err = archiver
            .archive(
                Path::new("/tmp/fdfuzz-abc123"),
                ".",
                Path::new("/out/fuzztargets.zip"),
            )
            .expect_err("archive should fail");

        match err {
            PackagerError::Archive { destination, .. } => {
                assert_eq!(destination, PathBuf::from("/out/fuzztargets.zip"));
            }
            other => panic!("expected Archive error, got {other:?}"),
        }
    }
}
