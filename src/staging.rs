//! Staging tree assembly.
//!
//! Builds the temporary directory tree that becomes the package archive:
//! artifact copy, qualifier renaming, executable patching, corpus
//! bundling, and shared-library merging. Stages run strictly in order
//! because each depends on the filesystem state left by the previous one.

use crate::archiver::Archiver;
use crate::error::{PackagerError, Result};
use crate::naming::{Qualifier, qualified_name};
use crate::patcher::{BinaryPatcher, EXECUTABLE_SEARCH_PATH, LIBRARY_SEARCH_PATH};
use log::debug;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Prefix of the uniquely-named temporary staging directory.
const STAGING_PREFIX: &str = "fdfuzz-";

/// Subdirectory of the staging tree that receives shared libraries.
const SHARED_LIBRARY_SUBDIR: &str = "lib";

/// Filename suffix identifying static archives, which are never patched.
const STATIC_ARCHIVE_SUFFIX: &str = ".a";

/// The temporary root directory owning all staged state for one run.
///
/// Created fresh and uniquely named per run; creation fails rather than
/// reusing an existing directory. The directory is removed when the tree
/// is dropped, after the final archive has been produced.
pub struct StagingTree {
    dir: TempDir,
}

impl StagingTree {
    /// Create a fresh staging directory under the OS temp root.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir()?;
        Ok(Self { dir })
    }

    /// Path of the staging root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Copy the raw artifact tree into the staging root, dereferencing
/// symbolic links so the archive is self-contained and portable.
///
/// # Errors
///
/// Returns [`PackagerError::Copy`] if any part of the copy fails.
pub fn copy_artifacts(tree: &StagingTree, artifact_dir: &Path) -> Result<()> {
    copy_dir_dereferenced(artifact_dir, tree.path())
}

/// Rename every top-level artifact entry with the qualifier suffix.
///
/// For each entry, the inner entry-named executable is renamed first and
/// the directory second. The order is a hard sequencing requirement: the
/// directory must still be at its original path when the file rename
/// executes. The new name is derived from the original name once, so a
/// second pass over an already-qualified tree cannot double-suffix.
///
/// # Errors
///
/// Returns [`PackagerError::Copy`] if a directory listing or rename fails.
pub fn apply_qualifier(root: &Path, qualifier: &Qualifier) -> Result<()> {
    for name in sorted_entry_names(root)? {
        let dir_path = root.join(&name);
        if !dir_path.is_dir() {
            continue;
        }
        let staged = qualified_name(&name, Some(qualifier));
        rename_entry(&dir_path.join(&name), &dir_path.join(&staged))?;
        rename_entry(&dir_path, &root.join(&staged))?;
    }
    Ok(())
}

/// Rewrite the search path of every top-level artifact's inner executable.
///
/// Each top-level entry is treated as an artifact directory whose
/// executable shares its name. A directory violating that precondition
/// fails the patch step loudly rather than being silently mis-patched.
///
/// # Errors
///
/// Returns [`PackagerError::Patch`] on the first patch-tool failure.
pub fn patch_executables(root: &Path, patcher: &BinaryPatcher<'_>) -> Result<()> {
    for name in sorted_entry_names(root)? {
        let executable = root.join(&name).join(&name);
        patcher.rewrite_search_path(&executable, EXECUTABLE_SEARCH_PATH)?;
    }
    Ok(())
}

/// Zip each seed corpus whose (qualified) target is staged.
///
/// Corpus directories are matched by name against staged artifact
/// directories. A corpus with no staged counterpart is skipped without
/// error; partial build outputs are an expected condition.
///
/// # Errors
///
/// Returns [`PackagerError::Copy`] if the corpus root cannot be listed,
/// or [`PackagerError::Archive`] if zipping a matched corpus fails.
pub fn bundle_corpora(
    root: &Path,
    corpus_root: &Path,
    qualifier: Option<&Qualifier>,
    archiver: &Archiver<'_>,
) -> Result<()> {
    for name in sorted_entry_names(corpus_root)? {
        let corpus_dir = corpus_root.join(&name);
        if !corpus_dir.is_dir() {
            continue;
        }
        let target = qualified_name(&name, qualifier);
        let staged_dir = root.join(&target);
        if !staged_dir.is_dir() {
            debug!("skipping corpus {name}: no staged target {target}");
            continue;
        }
        let destination = staged_dir.join(format!("{target}.zip"));
        archiver.archive(&corpus_dir, ".", &destination)?;
    }
    Ok(())
}

/// Copy shared libraries into the staging tree and patch each of them.
///
/// Unlike the artifact copy, symbolic links are preserved as links:
/// shared libraries may intentionally be versioned via symlinks. Only
/// regular, non-symlink, non-static-archive files are patched.
///
/// # Errors
///
/// Returns [`PackagerError::Copy`] if the copy fails, or
/// [`PackagerError::Patch`] on the first patch-tool failure.
pub fn merge_shared_libraries(
    root: &Path,
    lib_dir: &Path,
    patcher: &BinaryPatcher<'_>,
) -> Result<()> {
    let staged_lib = root.join(SHARED_LIBRARY_SUBDIR);
    copy_dir_preserving_links(lib_dir, &staged_lib)?;

    for name in sorted_entry_names(&staged_lib)? {
        let path = staged_lib.join(&name);
        let file_type = fs::symlink_metadata(&path)
            .map_err(|e| copy_error(&path, &e))?
            .file_type();
        if file_type.is_symlink() || file_type.is_dir() {
            continue;
        }
        if name.ends_with(STATIC_ARCHIVE_SUFFIX) {
            debug!("skipping static archive {name}");
            continue;
        }
        patcher.rewrite_search_path(&path, LIBRARY_SEARCH_PATH)?;
    }
    Ok(())
}

/// List the file names of a directory's entries in stable sorted order.
///
/// Names are collected before any of them is acted on, so renaming
/// entries never races the directory listing.
fn sorted_entry_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| copy_error(dir, &e))? {
        let entry = entry.map_err(|e| copy_error(dir, &e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Maximum directory depth for the dereferencing copy. A symlinked
/// directory that cycles back into the tree would otherwise recurse
/// without bound.
const MAX_COPY_DEPTH: usize = 64;

/// Recursively copy a directory, following symbolic links.
///
/// Both symlinked files and symlinked directories are replaced by copies
/// of their targets, so the result has no links left in it.
fn copy_dir_dereferenced(src: &Path, dst: &Path) -> Result<()> {
    copy_dir_dereferenced_at(src, dst, 0)
}

fn copy_dir_dereferenced_at(src: &Path, dst: &Path, depth: usize) -> Result<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(PackagerError::Copy {
            path: src.to_path_buf(),
            reason: format!(
                "directory tree exceeds {MAX_COPY_DEPTH} levels; symlink cycle suspected"
            ),
        });
    }
    fs::create_dir_all(dst).map_err(|e| copy_error(dst, &e))?;

    for entry in fs::read_dir(src).map_err(|e| copy_error(src, &e))? {
        let entry = entry.map_err(|e| copy_error(src, &e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        // fs::metadata follows links, unlike entry.file_type().
        let metadata = fs::metadata(&src_path).map_err(|e| copy_error(&src_path, &e))?;
        if metadata.is_dir() {
            copy_dir_dereferenced_at(&src_path, &dst_path, depth + 1)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| copy_error(&src_path, &e))?;
        }
    }

    Ok(())
}

/// Recursively copy a directory, preserving symbolic links as links.
fn copy_dir_preserving_links(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| copy_error(dst, &e))?;

    for entry in fs::read_dir(src).map_err(|e| copy_error(src, &e))? {
        let entry = entry.map_err(|e| copy_error(src, &e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        let file_type = entry.file_type().map_err(|e| copy_error(&src_path, &e))?;
        if file_type.is_symlink() {
            let target = fs::read_link(&src_path).map_err(|e| copy_error(&src_path, &e))?;
            create_symlink(&target, &dst_path).map_err(|e| copy_error(&dst_path, &e))?;
        } else if file_type.is_dir() {
            copy_dir_preserving_links(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| copy_error(&src_path, &e))?;
        }
    }

    Ok(())
}

/// Recreates a symbolic link (Unix implementation).
#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Recreates a symbolic link (Windows implementation). Staged shared
/// libraries are files, so file-symlink semantics apply.
#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Rename a staged entry, wrapping the I/O failure with the path involved.
fn rename_entry(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| copy_error(from, &e))
}

/// Wrap an I/O failure in a [`PackagerError::Copy`] naming the path.
fn copy_error(path: &Path, source: &std::io::Error) -> PackagerError {
    PackagerError::Copy {
        path: path.to_path_buf(),
        reason: source.to_string(),
    }
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
