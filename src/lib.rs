//! Fuzzing-artifact packaging library.
//!
//! This crate provides the core functionality for staging fuzzing build
//! outputs, rewriting their runtime library search paths, bundling seed
//! corpora, archiving the result, and publishing it to the fuzzing
//! backend's object store. It is used by the `fuzzpack` CLI binary and
//! can be consumed programmatically for testing or custom packaging
//! workflows.
//!
//! # Modules
//!
//! - [`archiver`] - Zip archive creation via the external `zip` tool
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Resolved, validated run configuration
//! - [`error`] - Semantic error types for every pipeline stage
//! - [`exec`] - Trait-based external command execution
//! - [`make_var`] - Makefile variable queries for build-output discovery
//! - [`naming`] - Qualifiers, commit SHAs, and remote object keys
//! - [`patcher`] - Runtime library search path rewriting
//! - [`pipeline`] - Sequential packaging pipeline orchestration
//! - [`publisher`] - Archive publication to the object store
//! - [`staging`] - Staging tree assembly

pub mod archiver;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod make_var;
pub mod naming;
pub mod patcher;
pub mod pipeline;
pub mod publisher;
pub mod staging;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
