//! Error types for the fuzzpack pipeline.
//!
//! This module defines semantic error variants matching the pipeline's
//! failure taxonomy. Every variant is fatal: the pipeline aborts on the
//! first failure and the binary reports a single failure line. External
//! tool diagnostics are carried verbatim because the tool's own output
//! is the most useful debugging signal.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while staging, packaging, or publishing artifacts.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// A configuration value was rejected before the pipeline started.
    #[error("configuration error: {reason}")]
    Config {
        /// Description of the rejected value.
        reason: String,
    },

    /// An external tool exited with a non-zero status.
    #[error("command `{command}` failed ({status})\n[stderr] {stderr}\n[stdout] {stdout}")]
    CommandFailed {
        /// The rendered command line that was invoked.
        command: String,
        /// Exit status reported by the operating system.
        status: ExitStatus,
        /// Captured standard output of the tool.
        stdout: String,
        /// Captured standard error of the tool.
        stderr: String,
    },

    /// A filesystem copy of artifacts, corpora, or libraries failed.
    #[error("copying {}: {reason}", .path.display())]
    Copy {
        /// The source or destination path involved in the copy.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// The search-path rewrite tool failed for a binary.
    #[error("rewriting search path of {}", .binary.display())]
    Patch {
        /// The binary that was being patched.
        binary: PathBuf,
        /// The underlying command failure, including tool diagnostics.
        #[source]
        source: Box<PackagerError>,
    },

    /// The compression tool failed to produce an archive.
    #[error("creating archive {}", .destination.display())]
    Archive {
        /// The archive path that was being written.
        destination: PathBuf,
        /// The underlying command failure, including tool diagnostics.
        #[source]
        source: Box<PackagerError>,
    },

    /// The upload to the object store failed.
    #[error("publishing {object}: {reason}")]
    Publish {
        /// The object key the upload targeted.
        object: String,
        /// Description of the transport or status failure.
        reason: String,
    },

    /// The service-account credential blob could not be deserialized.
    #[error("invalid service account credentials: {reason}")]
    Credentials {
        /// Description of the parse failure.
        reason: String,
    },

    /// A commit SHA supplied for object-key versioning was malformed.
    #[error("invalid commit SHA {value:?}: {reason}")]
    InvalidCommitSha {
        /// The rejected value.
        value: String,
        /// Description of why the value was rejected.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
