//! Resolved, validated run configuration.
//!
//! Bridges the raw CLI surface to the typed settings the pipeline
//! consumes. All validation happens here, before any filesystem
//! mutation: artifact-directory shape, commit-SHA format, credential
//! parsing, and output-path resolution.

use crate::cli::Cli;
use crate::error::{PackagerError, Result};
use crate::exec::CommandRunner;
use crate::make_var::query_make_var;
use crate::naming::{CommitSha, Qualifier};
use crate::publisher::ServiceCredentials;
use camino::{Utf8Path, Utf8PathBuf};
use std::path::PathBuf;

/// Environment variable consulted for the credentials blob when no
/// credentials file is given.
const CREDENTIALS_ENV: &str = "SERVICE_ACCOUNT_CREDENTIALS";

/// Default file name of the package archive.
const DEFAULT_ARCHIVE_NAME: &str = "fuzztargets.zip";

/// Validated settings for one packaging run.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Storage bucket the archive is uploaded to.
    pub bucket_name: String,
    /// Prefix of the uploaded object key.
    pub object_prefix: String,
    /// Cloud project scope, from the CLI or the credentials blob.
    pub project_id: Option<String>,
    /// Relative path to the built fuzz targets.
    pub artifact_dir: Utf8PathBuf,
    /// Optional suffix applied to staged target and corpus names.
    pub qualifier: Option<Qualifier>,
    /// Optional commit identifier appended to the object key.
    pub commit_sha: Option<CommitSha>,
    /// Directory holding per-target seed corpora.
    pub corpus_dir: Utf8PathBuf,
    /// Directory holding the shared runtime libraries to bundle.
    pub lib_dir: Utf8PathBuf,
    /// Absolute path the package archive is written to.
    pub output: Utf8PathBuf,
    /// Parsed upload credentials.
    pub credentials: ServiceCredentials,
    /// Stage and archive, but skip the upload.
    pub dry_run: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

impl PackageConfig {
    /// Resolve and validate the CLI arguments into a run configuration.
    ///
    /// `runner` is used only when the artifact directory is resolved
    /// through a Makefile variable.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] for an absolute or missing
    /// artifact directory, [`PackagerError::InvalidCommitSha`] for a
    /// malformed commit SHA, and [`PackagerError::Credentials`] when the
    /// credentials blob is absent or malformed.
    pub fn resolve(cli: &Cli, runner: &dyn CommandRunner) -> Result<Self> {
        let artifact_dir = resolve_artifact_dir(cli, runner)?;
        ensure_relative(&artifact_dir)?;

        let qualifier = cli.qualifier.as_deref().and_then(Qualifier::parse);
        let commit_sha = cli
            .commit_sha
            .as_deref()
            .map(CommitSha::try_from)
            .transpose()?;
        let credentials = load_credentials(cli)?;
        let project_id = cli
            .project_id
            .clone()
            .or_else(|| credentials.project_id().map(str::to_owned));
        let output = resolve_output(cli.output.as_deref())?;

        Ok(Self {
            bucket_name: cli.bucket_name.clone(),
            object_prefix: cli.object_prefix.clone(),
            project_id,
            artifact_dir,
            qualifier,
            commit_sha,
            corpus_dir: cli.corpus_dir.clone(),
            lib_dir: cli.lib_dir.clone(),
            output,
            credentials,
            dry_run: cli.dry_run,
            quiet: cli.quiet,
        })
    }
}

/// Determine the artifact directory from the CLI, querying the Makefile
/// variable when one is named.
fn resolve_artifact_dir(cli: &Cli, runner: &dyn CommandRunner) -> Result<Utf8PathBuf> {
    if let Some(dir) = &cli.artifact_dir {
        return Ok(dir.clone());
    }
    if let Some(var) = &cli.artifact_dir_make_var {
        let value = query_make_var(runner, var)?;
        return Ok(Utf8PathBuf::from(value));
    }
    Err(PackagerError::Config {
        reason: "one of --artifact-dir or --artifact-dir-make-var is required".to_owned(),
    })
}

/// Reject absolute artifact directories before any filesystem mutation.
fn ensure_relative(dir: &Utf8Path) -> Result<()> {
    if dir.is_absolute() {
        return Err(PackagerError::Config {
            reason: format!("artifact directory must be relative, got {dir}"),
        });
    }
    Ok(())
}

/// Load the credentials blob from the configured file, falling back to
/// the environment.
fn load_credentials(cli: &Cli) -> Result<ServiceCredentials> {
    let blob = match &cli.credentials_file {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|e| PackagerError::Credentials {
                reason: format!("reading {path}: {e}"),
            })?
        }
        None => std::env::var(CREDENTIALS_ENV).map_err(|_| PackagerError::Credentials {
            reason: format!(
                "no --credentials-file given and {CREDENTIALS_ENV} is not set"
            ),
        })?,
    };
    ServiceCredentials::from_json(&blob)
}

/// Resolve the archive path to an absolute location.
///
/// The archiver runs with the staging tree as its working directory, so
/// a relative destination would land inside the tree; relative requests
/// are anchored to the invocation directory instead, and the default
/// lands beside the running executable.
fn resolve_output(requested: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    match requested {
        Some(path) if path.is_absolute() => Ok(path.to_owned()),
        Some(path) => Ok(utf8_path(std::env::current_dir()?)?.join(path)),
        None => {
            let exe = std::env::current_exe()?;
            let dir = exe.parent().ok_or_else(|| PackagerError::Config {
                reason: "running executable has no parent directory".to_owned(),
            })?;
            Ok(utf8_path(dir.to_path_buf())?.join(DEFAULT_ARCHIVE_NAME))
        }
    }
}

/// Convert a system path to UTF-8, failing with a config error otherwise.
fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| PackagerError::Config {
        reason: format!("non-UTF-8 path {}", path.display()),
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
