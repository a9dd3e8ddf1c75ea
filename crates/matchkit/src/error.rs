//! Error types.
//!
//! Two kinds of failure leave this crate as values:
//!
//! - [`MatcherError`]: a matcher was built or used incorrectly (a bad
//!   pattern, conflicting constructor options, an unreadable file).
//! - [`MismatchError`]: an assertion failed; it carries the [`Mismatch`]
//!   that explains why.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::content::Details;
use crate::mismatch::Mismatch;

/// Errors raised while constructing or evaluating a matcher.
#[derive(Debug, Error)]
pub enum MatcherError {
    /// A regular expression failed to compile.
    #[error("invalid pattern /{pattern}/: {source}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// The underlying compile error.
        source: regex::Error,
    },

    /// Two mutually exclusive options were both supplied.
    #[error("{matcher}: supply only one of {first} or {second}")]
    ConflictingOptions {
        /// Matcher being built.
        matcher: &'static str,
        /// First option name.
        first: &'static str,
        /// Second option name.
        second: &'static str,
    },

    /// Neither of two required-alternative options was supplied.
    #[error("{matcher}: must supply one of {first} or {second}")]
    MissingOption {
        /// Matcher being built.
        matcher: &'static str,
        /// First option name.
        first: &'static str,
        /// Second option name.
        second: &'static str,
    },

    /// A filesystem operation failed for a reason other than absence.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being inspected.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// A specialized `Result` type for matcher construction.
pub type Result<T> = std::result::Result<T, MatcherError>;

/// An assertion failure produced by [`assert_that`](crate::assert_that).
///
/// In its default form the message is just the mismatch description. In
/// verbose form it names the candidate and the matcher as well:
///
/// ```text
/// Match failed. Matchee: 2
/// Matcher: Equals(1)
/// Difference: 1 != 2
/// ```
#[derive(Debug)]
pub struct MismatchError {
    matchee: String,
    matcher: String,
    mismatch: Box<dyn Mismatch>,
    verbose: bool,
}

impl MismatchError {
    /// Creates an error from rendered candidate and matcher text.
    pub fn new(
        matchee: impl Into<String>,
        matcher: impl Into<String>,
        mismatch: Box<dyn Mismatch>,
        verbose: bool,
    ) -> Self {
        Self {
            matchee: matchee.into(),
            matcher: matcher.into(),
            mismatch,
            verbose,
        }
    }

    /// Rendering of the value that failed to match.
    #[must_use]
    pub fn matchee(&self) -> &str {
        &self.matchee
    }

    /// Rendering of the matcher that rejected it.
    #[must_use]
    pub fn matcher(&self) -> &str {
        &self.matcher
    }

    /// The mismatch explaining the failure.
    #[must_use]
    pub fn mismatch(&self) -> &dyn Mismatch {
        self.mismatch.as_ref()
    }

    /// Details attached to the mismatch.
    #[must_use]
    pub fn details(&self) -> Details {
        self.mismatch.details()
    }

    /// Whether the message includes the candidate and the matcher.
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl fmt::Display for MismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let difference = self.mismatch.describe();
        if self.verbose {
            write!(
                f,
                "Match failed. Matchee: {}\nMatcher: {}\nDifference: {}\n",
                self.matchee, self.matcher, difference
            )
        } else {
            f.write_str(&difference)
        }
    }
}

impl std::error::Error for MismatchError {}
