//! Assertion configuration and the `assert_that` entry points.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MismatchError;
use crate::matcher::Matcher;

/// Environment variable consulted by [`AssertConfig::from_env`].
pub const VERBOSE_ENV: &str = "MATCHKIT_VERBOSE";

/// Settings applied when turning a mismatch into a [`MismatchError`].
///
/// Defaults:
/// - non-verbose: the error message is the mismatch description only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssertConfig {
    /// Include the candidate and the matcher in error messages.
    pub verbose: bool,
}

impl AssertConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self { verbose: false }
    }

    /// Enables or disables verbose error messages.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds a configuration from the environment.
    ///
    /// `MATCHKIT_VERBOSE` set to `1`, `true`, `yes` or `on` enables verbose
    /// messages.
    #[must_use]
    pub fn from_env() -> Self {
        let verbose = std::env::var(VERBOSE_ENV).is_ok_and(|value| parse_flag(&value));
        Self::new().with_verbose(verbose)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Checks `actual` against `matcher` with the default configuration.
///
/// # Errors
///
/// Returns a [`MismatchError`] carrying the mismatch when `actual` does not
/// match.
///
/// # Example
///
/// ```rust
/// use matchkit::{assert_that, Equals};
///
/// assert!(assert_that(&1, &Equals::new(1)).is_ok());
/// let err = assert_that(&2, &Equals::new(1)).unwrap_err();
/// assert_eq!(err.to_string(), "1 != 2");
/// ```
pub fn assert_that<T, M>(actual: &T, matcher: &M) -> Result<(), MismatchError>
where
    T: fmt::Debug + ?Sized,
    M: Matcher<T> + ?Sized,
{
    assert_that_with(&AssertConfig::default(), actual, matcher)
}

/// Checks `actual` against `matcher` with an explicit configuration.
///
/// # Errors
///
/// Returns a [`MismatchError`] carrying the mismatch when `actual` does not
/// match.
pub fn assert_that_with<T, M>(
    config: &AssertConfig,
    actual: &T,
    matcher: &M,
) -> Result<(), MismatchError>
where
    T: fmt::Debug + ?Sized,
    M: Matcher<T> + ?Sized,
{
    match matcher.match_value(actual) {
        None => Ok(()),
        Some(mismatch) => Err(MismatchError::new(
            format!("{actual:?}"),
            matcher.to_string(),
            mismatch,
            config.verbose,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Equals;

    #[test]
    fn default_is_not_verbose() {
        assert!(!AssertConfig::default().verbose);
        assert_eq!(AssertConfig::new(), AssertConfig::default());
    }

    #[test]
    fn parse_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(value), "{value:?} should enable");
        }
        for value in ["", "0", "false", "no", "verbose"] {
            assert!(!parse_flag(value), "{value:?} should not enable");
        }
    }

    #[test]
    fn assert_that_passes_on_match() {
        assert!(assert_that(&1, &Equals::new(1)).is_ok());
    }

    #[test]
    fn assert_that_reports_description() {
        let err = assert_that(&2, &Equals::new(1)).unwrap_err();
        assert_eq!(err.to_string(), "1 != 2");
        assert_eq!(err.matchee(), "2");
        assert_eq!(err.matcher(), "Equals(1)");
    }

    #[test]
    fn assert_that_with_verbose_config() {
        let config = AssertConfig::new().with_verbose(true);
        let err = assert_that_with(&config, &2, &Equals::new(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Match failed. Matchee: 2\nMatcher: Equals(1)\nDifference: 1 != 2\n"
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AssertConfig::new().with_verbose(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"verbose":true}"#);
        let parsed: AssertConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, AssertConfig::default());
    }
}
