//! CLI error handling with semantic exit codes.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected error, including file write failures |
//! | 2 | `Usage` | Invalid arguments, input records or configuration |
//! | 3 | `NotFound` | Input or configuration file does not exist |
//! | 5 | `Network` | Search-engine notification failed in transport |
//! | 6 | `Timeout` | Search-engine notification timed out |
//! | 8 | `Sequence` | Operation invoked out of sequence |
//!
//! ```bash
//! sitemapgen generate urls.txt --base-url https://example.com
//! case $? in
//!     0) echo "published" ;;
//!     2) echo "fix the URL list" ;;
//!     *) echo "other error" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,
    /// Invalid arguments, input or configuration (exit code 2).
    Usage = 2,
    /// A named file does not exist (exit code 3).
    NotFound = 3,
    /// Network failure (exit code 5).
    Network = 5,
    /// Operation timed out (exit code 6).
    Timeout = 6,
    /// Operation invoked out of sequence (exit code 8).
    Sequence = 8,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::Sequence => "sequence error",
        }
    }

    /// Map a library error to its category.
    #[must_use]
    pub fn from_core(err: &sitemapgen_core::Error) -> Self {
        use sitemapgen_core::Error;

        match err {
            e if e.is_invalid_argument() => Self::Usage,
            e if e.is_illegal_state() => Self::Sequence,
            Error::Config(_) | Error::Serialization(_) => Self::Usage,
            Error::Network(e) if e.is_timeout() => Self::Timeout,
            Error::Network(_) => Self::Network,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Create a not-found error.
    pub fn not_found(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::NotFound, source)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the error category of an `anyhow::Error`.
///
/// Explicit [`CliError`]s win; otherwise the first library error found in
/// the chain decides; anything else is internal.
#[must_use]
pub fn category_from_error(err: &anyhow::Error) -> ErrorCategory {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.category;
    }

    err.chain()
        .find_map(|cause| cause.downcast_ref::<sitemapgen_core::Error>())
        .map_or(ErrorCategory::Internal, ErrorCategory::from_core)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};
    use sitemapgen_core::Error;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorCategory::Internal.exit_code(), 1);
        assert_eq!(ErrorCategory::Usage.exit_code(), 2);
        assert_eq!(ErrorCategory::NotFound.exit_code(), 3);
        assert_eq!(ErrorCategory::Network.exit_code(), 5);
        assert_eq!(ErrorCategory::Sequence.exit_code(), 8);
    }

    #[test]
    fn test_core_error_mapping() {
        assert_eq!(
            ErrorCategory::from_core(&Error::InvalidPriority("2".into())),
            ErrorCategory::Usage
        );
        assert_eq!(ErrorCategory::from_core(&Error::NoChunks), ErrorCategory::Sequence);
        assert_eq!(
            ErrorCategory::from_core(&Error::Config("missing".into())),
            ErrorCategory::Usage
        );
        let missing = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(ErrorCategory::from_core(&missing), ErrorCategory::NotFound);
        assert_eq!(
            ErrorCategory::from_core(&Error::Compression("zlib".into())),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_category_through_context() {
        let err = Err::<(), _>(Error::InvalidUrl("bad".into()))
            .context("line 3")
            .unwrap_err();
        assert_eq!(category_from_error(&err), ErrorCategory::Usage);

        let err = anyhow::Error::new(CliError::not_found(anyhow!("urls.txt")));
        assert_eq!(category_from_error(&err), ErrorCategory::NotFound);

        assert_eq!(category_from_error(&anyhow!("boom")), ErrorCategory::Internal);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Sequence.to_string(), "sequence error");
        assert_eq!(ErrorCategory::Timeout.description(), "timeout");
    }
}
