//! Error types and handling for sitemapgen-core operations.
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Errors fall into
//! three families that callers usually treat differently:
//!
//! - **Invalid arguments**: a value supplied by the caller was rejected
//!   (malformed URL, unknown change frequency, out-of-range priority or limit,
//!   bad filename). Nothing was mutated.
//! - **Illegal state**: an operation was invoked outside the lifecycle state
//!   that permits it (robots update before finalize, finalize with no URLs).
//!   Nothing was mutated.
//! - **External failures**: file system, compression, or network errors coming
//!   from collaborators. These are surfaced as-is and never retried internally.
//!
//! ```rust
//! use sitemapgen_core::validate_change_frequency;
//!
//! match validate_change_frequency("sometimes") {
//!     Err(e) if e.is_invalid_argument() => eprintln!("rejected: {e}"),
//!     Err(e) => eprintln!("unexpected: {e}"),
//!     Ok(freq) => println!("ok: {freq}"),
//! }
//! ```

use thiserror::Error;

/// The main error type for sitemapgen-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A URL or path could not be turned into a valid sitemap location.
    ///
    /// ## Common Causes
    ///
    /// - Location longer than 2048 bytes after resolution
    /// - Fully-qualified URL pointing outside the configured base
    /// - Unparseable address or unsupported scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A change-frequency token is not one of the seven protocol values.
    #[error("Invalid change frequency '{0}': expected one of always, hourly, daily, weekly, monthly, yearly, never")]
    InvalidChangeFrequency(String),

    /// A priority is not one of the canonical tenths between 0.0 and 1.0.
    #[error("Invalid priority '{0}': expected one of 0.0, 0.1, ..., 1.0")]
    InvalidPriority(String),

    /// A numeric setting fell outside its permitted range.
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the setting that was rejected.
        name: &'static str,
        /// Value that was supplied.
        value: u64,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },

    /// A filename setter received an empty name, a path, or a wrong extension.
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// An operation was invoked outside the lifecycle state that permits it.
    ///
    /// The session is left unchanged; callers can inspect
    /// [`SitemapSession::state`](crate::SitemapSession::state) and retry.
    #[error("{operation} called out of sequence: {reason}")]
    IllegalState {
        /// The rejected operation.
        operation: &'static str,
        /// Why the current state forbids it.
        reason: String,
    },

    /// The sitemap index was rendered before any chunk was recorded.
    #[error("Sitemap index has no chunks to reference")]
    NoChunks,

    /// I/O operation failed.
    ///
    /// Covers reads and writes performed by a [`FileStore`](crate::FileStore).
    /// The underlying `std::io::Error` is preserved.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed while notifying a search engine.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The compression collaborator failed to encode a chunk.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Rendering or (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Build an [`Error::IllegalState`] for `operation`.
    pub fn illegal_state(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::IllegalState {
            operation,
            reason: reason.into(),
        }
    }

    /// Returns `true` when the caller supplied a rejected value.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_)
                | Self::InvalidChangeFrequency(_)
                | Self::InvalidPriority(_)
                | Self::OutOfRange { .. }
                | Self::InvalidFilename(_)
        )
    }

    /// Returns `true` when an operation was invoked out of sequence.
    #[must_use]
    pub const fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState { .. } | Self::NoChunks)
    }

    /// Check if the error might be recoverable through retry logic.
    ///
    /// Only transient collaborator failures qualify: network timeouts and
    /// connection errors, and interrupted or timed-out I/O. The session never
    /// retries on its own; this is a hint for callers.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for structured logging and for mapping errors to exit codes.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_)
            | Self::InvalidChangeFrequency(_)
            | Self::InvalidPriority(_)
            | Self::OutOfRange { .. }
            | Self::InvalidFilename(_) => "invalid_argument",
            Self::IllegalState { .. } | Self::NoChunks => "illegal_state",
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Compression(_) => "compression",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
