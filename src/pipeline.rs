//! Sequential packaging pipeline.
//!
//! Runs the staging, patching, bundling, archiving, and publishing steps
//! in their required order against an injected command runner and object
//! store. Every step is a blocking call; the first failure aborts the
//! run and the staging tree is removed on drop.

use crate::archiver::Archiver;
use crate::config::PackageConfig;
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::naming::ObjectKey;
use crate::patcher::BinaryPatcher;
use crate::publisher::ObjectStore;
use crate::staging::{
    StagingTree, apply_qualifier, bundle_corpora, copy_artifacts, merge_shared_libraries,
    patch_executables,
};
use std::io::Write;

/// Orchestrates one packaging run.
pub struct PackagePipeline<'a> {
    config: &'a PackageConfig,
    runner: &'a dyn CommandRunner,
    store: &'a dyn ObjectStore,
}

impl<'a> PackagePipeline<'a> {
    /// Create a pipeline over the given configuration and collaborators.
    #[must_use]
    pub fn new(
        config: &'a PackageConfig,
        runner: &'a dyn CommandRunner,
        store: &'a dyn ObjectStore,
    ) -> Self {
        Self {
            config,
            runner,
            store,
        }
    }

    /// Run the pipeline to completion, returning the object key the
    /// archive was (or, on a dry run, would have been) uploaded under.
    ///
    /// Progress lines are written to `progress` unless the configuration
    /// is quiet; write failures on the progress sink are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; every error is fatal.
    pub fn run(&self, progress: &mut dyn Write) -> Result<ObjectKey> {
        let patcher = BinaryPatcher::new(self.runner);
        let archiver = Archiver::new(self.runner);

        let tree = StagingTree::create()?;
        self.report(progress, &format!("Working in {}", tree.path().display()));

        copy_artifacts(&tree, self.config.artifact_dir.as_std_path())?;
        if let Some(qualifier) = &self.config.qualifier {
            apply_qualifier(tree.path(), qualifier)?;
        }
        patch_executables(tree.path(), &patcher)?;
        bundle_corpora(
            tree.path(),
            self.config.corpus_dir.as_std_path(),
            self.config.qualifier.as_ref(),
            &archiver,
        )?;
        merge_shared_libraries(tree.path(), self.config.lib_dir.as_std_path(), &patcher)?;

        archiver.archive(tree.path(), ".", self.config.output.as_std_path())?;
        self.report(progress, &format!("Archived to {}", self.config.output));

        let key = ObjectKey::for_now(
            self.config.object_prefix.clone(),
            self.config.commit_sha.clone(),
        );
        if self.config.dry_run {
            self.report(progress, &format!("Dry run: skipping upload of {key}"));
        } else {
            self.store.put_object(
                &self.config.bucket_name,
                &key.to_string(),
                self.config.output.as_std_path(),
            )?;
            self.report(
                progress,
                &format!("Uploaded {key} to {}", self.config.bucket_name),
            );
        }
        Ok(key)
    }

    /// Write one progress line unless quiet; sink failures are ignored.
    fn report(&self, progress: &mut dyn Write, line: &str) {
        if self.config.quiet {
            return;
        }
        let _ = writeln!(progress, "{line}");
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
