//! CLI argument definitions for the fuzzing-artifact packager.
//!
//! This module defines the command-line interface using clap. It is
//! separated from the main entrypoint to keep the binary small and
//! focused on orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Package fuzzing build artifacts and publish them to the fuzzing backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "fuzzpack")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package fuzzing build artifacts and publish them to the fuzzing backend.\n\n",
    "The built fuzz targets, their seed corpora, and the shared runtime ",
    "libraries they load are staged into a temporary directory, patched so ",
    "their dynamic-library search paths are relative to the deployed layout, ",
    "archived as a single zip, and uploaded to the configured storage bucket ",
    "under a timestamped object key.\n\n",
    "The artifact directory is given directly with --artifact-dir, or resolved ",
    "from the fuzz build's Makefile with --artifact-dir-make-var VAR, which ",
    "runs `make print-VAR`. Either way it must be a relative path.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package the build under build/fuzz and upload it:\n",
    "    $ fuzzpack --bucket-name fd-fuzz-targets --object-prefix fd-targets \\\n",
    "        --artifact-dir build/fuzz --credentials-file creds.json\n\n",
    "  Resolve the artifact directory from the Makefile and tag the upload:\n",
    "    $ fuzzpack --bucket-name fd-fuzz-targets --object-prefix fd-targets \\\n",
    "        --artifact-dir-make-var BUILDDIR --qualifier asan \\\n",
    "        --commit-sha 0badf00d1 --credentials-file creds.json\n\n",
    "  Preview without uploading:\n",
    "    $ fuzzpack --bucket-name fd-fuzz-targets --object-prefix fd-targets \\\n",
    "        --artifact-dir build/fuzz --credentials-file creds.json --dry-run\n",
))]
pub struct Cli {
    /// Storage bucket the package archive is uploaded to.
    #[arg(long, value_name = "BUCKET")]
    pub bucket_name: String,

    /// Prefix of the uploaded object key.
    #[arg(long, value_name = "PREFIX")]
    pub object_prefix: String,

    /// Cloud project the bucket belongs to [default: taken from credentials].
    #[arg(long, value_name = "ID")]
    pub project_id: Option<String>,

    /// File holding the service-account credentials JSON blob
    /// [default: the SERVICE_ACCOUNT_CREDENTIALS environment variable].
    #[arg(long, value_name = "FILE")]
    pub credentials_file: Option<Utf8PathBuf>,

    /// Relative path to the built fuzz targets.
    #[arg(long, value_name = "DIR", conflicts_with = "artifact_dir_make_var")]
    pub artifact_dir: Option<Utf8PathBuf>,

    /// Resolve the artifact directory by querying this Makefile variable
    /// via `make print-<VAR>`.
    #[arg(long, value_name = "VAR")]
    pub artifact_dir_make_var: Option<String>,

    /// Suffix appended to every staged target and corpus name.
    #[arg(long, value_name = "QUALIFIER")]
    pub qualifier: Option<String>,

    /// Commit SHA appended to the object key (7-40 lowercase hex).
    #[arg(long, value_name = "SHA")]
    pub commit_sha: Option<String>,

    /// Directory holding per-target seed corpora.
    #[arg(long, value_name = "DIR", default_value = "corpus")]
    pub corpus_dir: Utf8PathBuf,

    /// Directory holding the shared runtime libraries to bundle.
    #[arg(long, value_name = "DIR", default_value = "opt/lib")]
    pub lib_dir: Utf8PathBuf,

    /// Path of the package archive [default: fuzztargets.zip beside the
    /// running executable].
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// Stage and archive, but skip the upload.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn parses_minimal_invocation() {
        let cli = parse(&[
            "fuzzpack",
            "--bucket-name",
            "fd-fuzz-targets",
            "--object-prefix",
            "fd-targets",
            "--artifact-dir",
            "build/fuzz",
        ]);
        assert_eq!(cli.bucket_name, "fd-fuzz-targets");
        assert_eq!(cli.object_prefix, "fd-targets");
        assert_eq!(
            cli.artifact_dir,
            Some(Utf8PathBuf::from("build/fuzz"))
        );
        assert_eq!(cli.corpus_dir, Utf8PathBuf::from("corpus"));
        assert_eq!(cli.lib_dir, Utf8PathBuf::from("opt/lib"));
        assert!(!cli.dry_run);
        assert!(!cli.quiet);
    }

    #[test]
    fn artifact_dir_conflicts_with_make_var() {
        let result = Cli::try_parse_from([
            "fuzzpack",
            "--bucket-name",
            "b",
            "--object-prefix",
            "p",
            "--artifact-dir",
            "build/fuzz",
            "--artifact-dir-make-var",
            "BUILDDIR",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_optional_tagging_flags() {
        let cli = parse(&[
            "fuzzpack",
            "--bucket-name",
            "b",
            "--object-prefix",
            "p",
            "--artifact-dir-make-var",
            "BUILDDIR",
            "--qualifier",
            "asan",
            "--commit-sha",
            "0badf00d1",
            "--dry-run",
        ]);
        assert_eq!(cli.artifact_dir_make_var.as_deref(), Some("BUILDDIR"));
        assert_eq!(cli.qualifier.as_deref(), Some("asan"));
        assert_eq!(cli.commit_sha.as_deref(), Some("0badf00d1"));
        assert!(cli.dry_run);
    }
}
