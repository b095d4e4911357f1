//! Runtime library search path (RPATH) rewriting.
//!
//! Staged executables and shared libraries are patched so the dynamic
//! loader resolves their dependencies relative to the binary's own
//! location at load time. The search-path expression is handed to the
//! patch tool as a single literal argument, never through a shell, so
//! `$ORIGIN` stays unexpanded until load time.

use crate::error::{PackagerError, Result};
use crate::exec::{CommandRunner, run_checked};
use log::debug;
use std::path::Path;

/// The external tool used to rewrite the dynamic-library search path.
const PATCH_TOOL: &str = "patchelf";

/// Search path for staged executables: their libraries live one level up,
/// under `lib/`.
pub const EXECUTABLE_SEARCH_PATH: &str = "$ORIGIN/../lib/";

/// Search path for staged shared libraries: they resolve sibling
/// libraries in the same directory, with no relative ascent.
pub const LIBRARY_SEARCH_PATH: &str = "$ORIGIN";

/// Rewrites the dynamic-library search path of staged binaries.
pub struct BinaryPatcher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> BinaryPatcher<'a> {
    /// Create a patcher that invokes the patch tool through `runner`.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Overwrite the search path of `binary` with `search_path`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Patch`] when the patch tool exits
    /// non-zero; the tool's own stdout and stderr are preserved in the
    /// error chain.
    pub fn rewrite_search_path(&self, binary: &Path, search_path: &str) -> Result<()> {
        debug!(
            "running: {PATCH_TOOL} {} --set-rpath {search_path}",
            binary.display()
        );
        let binary_arg = binary.to_string_lossy();
        run_checked(
            self.runner,
            PATCH_TOOL,
            &[binary_arg.as_ref(), "--set-rpath", search_path],
            None,
        )
        .map_err(|source| PackagerError::Patch {
            binary: binary.to_path_buf(),
            source: Box::new(source),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubRunner, failure_output, success_output};

    #[test]
    fn passes_executable_search_path_token_verbatim() {
        let runner = StubRunner::new(vec![ExpectedCall {
            command: "patchelf",
            args: vec![
                "/stage/target/target".to_owned(),
                "--set-rpath".to_owned(),
                "$ORIGIN/../lib/".to_owned(),
            ],
            working_dir: None,
            result: Ok(success_output()),
        }]);

        let patcher = BinaryPatcher::new(&runner);
        patcher
            .rewrite_search_path(Path::new("/stage/target/target"), EXECUTABLE_SEARCH_PATH)
            .expect("patch should succeed");
        runner.assert_finished();
    }

    #[test]
    fn passes_library_search_path_token_verbatim() {
        let runner = StubRunner::new(vec![ExpectedCall {
            command: "patchelf",
            args: vec![
                "/stage/lib/libfoo.so".to_owned(),
                "--set-rpath".to_owned(),
                "$ORIGIN".to_owned(),
            ],
            working_dir: None,
            result: Ok(success_output()),
        }]);

        let patcher = BinaryPatcher::new(&runner);
        patcher
            .rewrite_search_path(Path::new("/stage/lib/libfoo.so"), LIBRARY_SEARCH_PATH)
            .expect("patch should succeed");
        runner.assert_finished();
    }

    #[test]
    fn non_zero_exit_becomes_patch_error() {
        let runner = StubRunner::new(vec![ExpectedCall {
            command: "patchelf",
            args: vec![
                "/stage/target/target".to_owned(),
                "--set-rpath".to_owned(),
                "$ORIGIN/../lib/".to_owned(),
            ],
            working_dir: None,
            result: Ok(failure_output("not an ELF executable")),
        }]);

        let patcher = BinaryPatcher::new(&runner);
        let err = patcher
            .rewrite_search_path(Path::new("/stage/target/target"), EXECUTABLE_SEARCH_PATH)
            .expect_err("patch should fail");

        assert!(matches!(err, PackagerError::Patch { .. }));
        let chain = format!("{:?}", err);
        assert!(chain.contains("not an ELF executable"));
    }
}
