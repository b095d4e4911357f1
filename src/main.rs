//! Fuzzing-artifact packager CLI entrypoint.
//!
//! This binary stages a fuzzing build's targets, corpora, and shared
//! libraries, archives them, and uploads the archive to the configured
//! storage bucket.

use clap::Parser;
use fuzzpack::cli::Cli;
use fuzzpack::config::PackageConfig;
use fuzzpack::error::Result;
use fuzzpack::exec::SystemCommandRunner;
use fuzzpack::naming::ObjectKey;
use fuzzpack::pipeline::PackagePipeline;
use fuzzpack::publisher::GcsObjectStore;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<ObjectKey> {
    let runner = SystemCommandRunner;
    let config = PackageConfig::resolve(cli, &runner)?;
    let store = GcsObjectStore::new(config.credentials.clone(), config.project_id.clone());
    PackagePipeline::new(&config, &runner, &store).run(stderr)
}

fn exit_code_for_run_result(result: Result<ObjectKey>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzzpack::error::PackagerError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let key = ObjectKey::new("fd-targets", 1_700_000_000_000, None);
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(key), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = PackagerError::Config {
            reason: "artifact directory must be relative, got /opt/build".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("artifact directory must be relative"));
    }
}
