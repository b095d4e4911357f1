use super::*;
use crate::test_utils::{ExpectedCall, RecordingRunner, StubRunner, success_output_with_stdout};
use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;

const CREDENTIALS_BLOB: &str = r#"{"access_token": "ya29.token", "project_id": "fd-fuzzing"}"#;

fn credentials_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create credentials file");
    file.write_all(CREDENTIALS_BLOB.as_bytes())
        .expect("write credentials");
    file
}

fn parse_with_credentials(file: &NamedTempFile, extra: &[&str]) -> Cli {
    let mut args = vec![
        "fuzzpack",
        "--bucket-name",
        "fd-fuzz-targets",
        "--object-prefix",
        "fd-targets",
        "--credentials-file",
        file.path().to_str().expect("utf-8 temp path"),
    ];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).expect("arguments should parse")
}

#[test]
fn resolves_explicit_artifact_dir() {
    let creds = credentials_file();
    let cli = parse_with_credentials(&creds, &["--artifact-dir", "build/fuzz"]);

    let runner = RecordingRunner::new();
    let config = PackageConfig::resolve(&cli, &runner).expect("config should resolve");

    assert_eq!(config.artifact_dir, Utf8PathBuf::from("build/fuzz"));
    assert!(runner.calls().is_empty(), "no tool queries expected");
    assert_eq!(config.project_id.as_deref(), Some("fd-fuzzing"));
}

#[test]
fn resolves_artifact_dir_through_make_variable() {
    let creds = credentials_file();
    let cli = parse_with_credentials(&creds, &["--artifact-dir-make-var", "BUILDDIR"]);

    let runner = StubRunner::new(vec![ExpectedCall {
        command: "make",
        args: vec!["print-BUILDDIR".to_owned()],
        working_dir: None,
        result: Ok(success_output_with_stdout("linux/clang/x86_64_fuzz_asan\n")),
    }]);
    let config = PackageConfig::resolve(&cli, &runner).expect("config should resolve");

    assert_eq!(
        config.artifact_dir,
        Utf8PathBuf::from("linux/clang/x86_64_fuzz_asan")
    );
    runner.assert_finished();
}

#[test]
fn rejects_absolute_artifact_dir_before_any_mutation() {
    let creds = credentials_file();
    let cli = parse_with_credentials(&creds, &["--artifact-dir", "/opt/build/fuzz"]);

    let runner = RecordingRunner::new();
    let err = PackageConfig::resolve(&cli, &runner).expect_err("resolve should fail");

    assert!(matches!(err, PackagerError::Config { .. }));
    assert!(err.to_string().contains("relative"));
    assert!(runner.calls().is_empty(), "no tools may run for a rejected config");
}

#[test]
fn requires_an_artifact_dir_source() {
    let creds = credentials_file();
    let cli = parse_with_credentials(&creds, &[]);

    let err = PackageConfig::resolve(&cli, &RecordingRunner::new())
        .expect_err("resolve should fail");
    assert!(matches!(err, PackagerError::Config { .. }));
}

#[test]
fn blank_qualifier_is_treated_as_absent() {
    let creds = credentials_file();
    let cli = parse_with_credentials(
        &creds,
        &["--artifact-dir", "build/fuzz", "--qualifier", "   "],
    );

    let config =
        PackageConfig::resolve(&cli, &RecordingRunner::new()).expect("config should resolve");
    assert!(config.qualifier.is_none());
}

#[test]
fn malformed_commit_sha_is_rejected() {
    let creds = credentials_file();
    let cli = parse_with_credentials(
        &creds,
        &["--artifact-dir", "build/fuzz", "--commit-sha", "NOTHEX!"],
    );

    let err = PackageConfig::resolve(&cli, &RecordingRunner::new())
        .expect_err("resolve should fail");
    assert!(matches!(err, PackagerError::InvalidCommitSha { .. }));
}

#[test]
fn explicit_project_id_overrides_credentials() {
    let creds = credentials_file();
    let cli = parse_with_credentials(
        &creds,
        &["--artifact-dir", "build/fuzz", "--project-id", "override"],
    );

    let config =
        PackageConfig::resolve(&cli, &RecordingRunner::new()).expect("config should resolve");
    assert_eq!(config.project_id.as_deref(), Some("override"));
}

#[test]
fn unreadable_credentials_file_is_a_credentials_error() {
    let cli = Cli::try_parse_from([
        "fuzzpack",
        "--bucket-name",
        "b",
        "--object-prefix",
        "p",
        "--credentials-file",
        "/nonexistent/creds.json",
        "--artifact-dir",
        "build/fuzz",
    ])
    .expect("arguments should parse");

    let err = PackageConfig::resolve(&cli, &RecordingRunner::new())
        .expect_err("resolve should fail");
    assert!(matches!(err, PackagerError::Credentials { .. }));
}

#[test]
fn relative_output_is_anchored_to_invocation_directory() {
    let creds = credentials_file();
    let cli = parse_with_credentials(
        &creds,
        &["--artifact-dir", "build/fuzz", "--output", "out/pkg.zip"],
    );

    let config =
        PackageConfig::resolve(&cli, &RecordingRunner::new()).expect("config should resolve");
    assert!(config.output.is_absolute());
    assert!(config.output.ends_with("out/pkg.zip"));
}

#[test]
fn default_output_lands_beside_the_executable() {
    let creds = credentials_file();
    let cli = parse_with_credentials(&creds, &["--artifact-dir", "build/fuzz"]);

    let config =
        PackageConfig::resolve(&cli, &RecordingRunner::new()).expect("config should resolve");
    assert!(config.output.is_absolute());
    assert_eq!(config.output.file_name(), Some("fuzztargets.zip"));
}
