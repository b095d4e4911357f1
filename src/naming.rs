//! Naming policy for staged artifacts and remote object keys.
//!
//! Qualifiers distinguish artifacts built under different configurations
//! when several pipeline runs' outputs might otherwise collide by name.
//! Object keys version each uploaded archive by upload time and,
//! optionally, by the commit that produced the build.

use crate::error::{PackagerError, Result};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Minimum length of an abbreviated git commit SHA (7 hex characters).
const SHA_MIN_LEN: usize = 7;

/// Maximum length of a full git SHA-1 (40 hex characters).
const SHA_MAX_LEN: usize = 40;

/// File extension of the uploaded package archive.
const ARCHIVE_EXTENSION: &str = ".zip";

/// An optional suffix applied to every artifact and corpus name.
///
/// Surrounding whitespace is trimmed; a value that is empty after trimming
/// is treated as absent.
///
/// # Examples
///
/// ```
/// use fuzzpack::naming::Qualifier;
///
/// assert!(Qualifier::parse("  ").is_none());
/// let q = Qualifier::parse(" asan ").expect("non-empty after trim");
/// assert_eq!(q.as_str(), "asan");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier(String);

impl Qualifier {
    /// Parse a raw qualifier value, returning `None` when it is empty
    /// after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Return the qualifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the staged name for an artifact or corpus.
///
/// The result is a pure function of the original name: applying it twice
/// to the same input yields the same output, never a double suffix.
#[must_use]
pub fn qualified_name(name: &str, qualifier: Option<&Qualifier>) -> String {
    match qualifier {
        Some(q) => format!("{name}-{q}"),
        None => name.to_owned(),
    }
}

/// A validated abbreviated or full git commit SHA, used to make object
/// keys content-identifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSha(String);

impl CommitSha {
    /// Return the SHA as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CommitSha {
    type Error = PackagerError;

    fn try_from(value: &str) -> Result<Self> {
        validate_commit_sha(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for CommitSha {
    type Error = PackagerError;

    fn try_from(value: String) -> Result<Self> {
        validate_commit_sha(&value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a well-formed lowercase git SHA.
fn validate_commit_sha(value: &str) -> Result<()> {
    let reject = |reason: String| PackagerError::InvalidCommitSha {
        value: value.to_owned(),
        reason,
    };
    if value.len() < SHA_MIN_LEN {
        return Err(reject(format!(
            "SHA must be at least {SHA_MIN_LEN} characters, got {}",
            value.len()
        )));
    }
    if value.len() > SHA_MAX_LEN {
        return Err(reject(format!(
            "SHA must be at most {SHA_MAX_LEN} characters, got {}",
            value.len()
        )));
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(reject(format!("non-hex character '{bad}'")));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(reject("SHA must be lowercase".to_owned()));
    }
    Ok(())
}

/// The versioned key an archive is uploaded under.
///
/// Rendered as `{prefix}-{timestampMillis}[-{commitSha}].zip`. Uniqueness
/// across runs comes from the timestamp plus the content-identifying
/// commit, not from any locking.
///
/// # Examples
///
/// ```
/// use fuzzpack::naming::{CommitSha, ObjectKey};
///
/// let sha = CommitSha::try_from("abc1234").expect("valid SHA");
/// let key = ObjectKey::new("fd-targets", 1_700_000_000_000, Some(sha));
/// assert_eq!(key.to_string(), "fd-targets-1700000000000-abc1234.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    prefix: String,
    timestamp_millis: u64,
    commit: Option<CommitSha>,
}

impl ObjectKey {
    /// Create an object key from explicit components.
    #[must_use]
    pub fn new(prefix: impl Into<String>, timestamp_millis: u64, commit: Option<CommitSha>) -> Self {
        Self {
            prefix: prefix.into(),
            timestamp_millis,
            commit,
        }
    }

    /// Create an object key stamped with the current wall-clock time.
    #[must_use]
    pub fn for_now(prefix: impl Into<String>, commit: Option<CommitSha>) -> Self {
        Self::new(prefix, now_millis(), commit)
    }

    /// Return the millisecond timestamp component.
    #[must_use]
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp_millis
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.timestamp_millis)?;
        if let Some(commit) = &self.commit {
            write!(f, "-{commit}")?;
        }
        write!(f, "{ARCHIVE_EXTENSION}")
    }
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("asan", Some("asan"))]
    #[case::padded("  msan  ", Some("msan"))]
    #[case::empty("", None)]
    #[case::whitespace_only("   ", None)]
    fn qualifier_parse_trims_and_drops_empty(#[case] raw: &str, #[case] expected: Option<&str>) {
        let parsed = Qualifier::parse(raw);
        assert_eq!(parsed.as_ref().map(Qualifier::as_str), expected);
    }

    #[test]
    fn qualified_name_appends_suffix() {
        let q = Qualifier::parse("asan").expect("valid qualifier");
        assert_eq!(qualified_name("target", Some(&q)), "target-asan");
        assert_eq!(qualified_name("target", None), "target");
    }

    #[test]
    fn qualified_name_is_pure_in_its_input() {
        let q = Qualifier::parse("asan").expect("valid qualifier");
        let first = qualified_name("target", Some(&q));
        let second = qualified_name("target", Some(&q));
        assert_eq!(first, second, "repeat application must not accumulate");
    }

    #[rstest]
    #[case::abbreviated("abc1234", true)]
    #[case::full("0123456789abcdef0123456789abcdef01234567", true)]
    #[case::too_short("abc123", false)]
    #[case::non_hex("abc123g", false)]
    #[case::uppercase("ABC1234", false)]
    #[case::empty("", false)]
    fn commit_sha_validation(#[case] value: &str, #[case] expect_ok: bool) {
        assert_eq!(CommitSha::try_from(value).is_ok(), expect_ok);
    }

    #[test]
    fn commit_sha_rejects_overlong_value() {
        let long = "a".repeat(41);
        assert!(CommitSha::try_from(long).is_err());
    }

    #[test]
    fn object_key_without_commit_omits_suffix() {
        let key = ObjectKey::new("fd-targets", 1_700_000_000_000, None);
        assert_eq!(key.to_string(), "fd-targets-1700000000000.zip");
    }

    #[test]
    fn object_keys_with_distinct_timestamps_are_distinct() {
        let first = ObjectKey::new("fd-targets", 1_700_000_000_000, None);
        let second = ObjectKey::new("fd-targets", 1_700_000_000_001, None);
        assert_ne!(first.to_string(), second.to_string());
    }

    #[test]
    fn object_keys_with_distinct_commits_are_distinct() {
        let ts = 1_700_000_000_000;
        let first = ObjectKey::new(
            "fd-targets",
            ts,
            Some(CommitSha::try_from("abc1234").expect("valid SHA")),
        );
        let second = ObjectKey::new(
            "fd-targets",
            ts,
            Some(CommitSha::try_from("def5678").expect("valid SHA")),
        );
        assert_ne!(first.to_string(), second.to_string());
    }

    #[test]
    fn for_now_produces_recent_timestamp() {
        let key = ObjectKey::for_now("fd-targets", None);
        assert!(key.timestamp_millis() > 1_600_000_000_000);
    }
}
