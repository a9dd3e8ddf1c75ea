//! Leaf matchers for plain values and text.

use std::cmp::Ordering;
use std::fmt;

use bitflags::bitflags;
use regex::{Regex, RegexBuilder};

use crate::error::{MatcherError, Result};
use crate::matcher::Matcher;
use crate::mismatch::{BinaryMismatch, Mismatch, fail};
use crate::repr::{callable_repr, escape_pattern, text_repr};

// =============================================================================
// Comparisons
// =============================================================================

macro_rules! comparison_matcher {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name<E> {
            expected: E,
        }

        impl<E> $name<E> {
            /// Creates the matcher around the reference value.
            pub const fn new(expected: E) -> Self {
                Self { expected }
            }

            /// Returns the reference value.
            pub const fn expected(&self) -> &E {
                &self.expected
            }
        }

        impl<E: fmt::Debug> fmt::Display for $name<E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.expected)
            }
        }
    };
}

comparison_matcher!(
    /// Matches values equal to the reference: `1 != 2` on failure.
    Equals
);
comparison_matcher!(
    /// Matches values not equal to the reference: `1 == 1` on failure.
    NotEquals
);
comparison_matcher!(
    /// Matches values strictly less than the reference.
    LessThan
);
comparison_matcher!(
    /// Matches values strictly greater than the reference.
    GreaterThan
);

impl<T, E> Matcher<T> for Equals<E>
where
    T: fmt::Debug + ?Sized,
    E: PartialEq<T> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        if self.expected == *actual {
            return None;
        }
        Some(binary(&self.expected, "!=", actual))
    }
}

impl<T, E> Matcher<T> for NotEquals<E>
where
    T: fmt::Debug + ?Sized,
    E: PartialEq<T> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        if self.expected != *actual {
            return None;
        }
        Some(binary(&self.expected, "==", actual))
    }
}

impl<T, E> Matcher<T> for LessThan<E>
where
    T: fmt::Debug + ?Sized,
    E: PartialOrd<T> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        if self.expected.partial_cmp(actual) == Some(Ordering::Greater) {
            return None;
        }
        Some(binary(&self.expected, "is not >", actual))
    }
}

impl<T, E> Matcher<T> for GreaterThan<E>
where
    T: fmt::Debug + ?Sized,
    E: PartialOrd<T> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        if self.expected.partial_cmp(actual) == Some(Ordering::Less) {
            return None;
        }
        Some(binary(&self.expected, "is not <", actual))
    }
}

fn binary<E, T>(expected: &E, operator: &'static str, actual: &T) -> Box<dyn Mismatch>
where
    E: fmt::Debug + ?Sized,
    T: fmt::Debug + ?Sized,
{
    Box::new(BinaryMismatch::new(
        format!("{expected:?}"),
        operator,
        format!("{actual:?}"),
    ))
}

// =============================================================================
// Containment and length
// =============================================================================

/// Matches text containing a substring, or a sequence containing an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contains<N> {
    needle: N,
}

impl<N> Contains<N> {
    /// Creates the matcher for `needle`.
    pub const fn new(needle: N) -> Self {
        Self { needle }
    }
}

impl<N: fmt::Debug> fmt::Display for Contains<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contains({:?})", self.needle)
    }
}

impl<N> Contains<N> {
    fn not_in<H: fmt::Debug + ?Sized>(&self, haystack: &H) -> Option<Box<dyn Mismatch>>
    where
        N: fmt::Debug,
    {
        fail(format!("{:?} not in {haystack:?}", self.needle))
    }
}

impl<N> Matcher<str> for Contains<N>
where
    N: AsRef<str> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &str) -> Option<Box<dyn Mismatch>> {
        if actual.contains(self.needle.as_ref()) {
            None
        } else {
            self.not_in(actual)
        }
    }
}

impl<N> Matcher<String> for Contains<N>
where
    N: AsRef<str> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &String) -> Option<Box<dyn Mismatch>> {
        Matcher::<str>::match_value(self, actual.as_str())
    }
}

impl<T, N> Matcher<[T]> for Contains<N>
where
    T: fmt::Debug,
    N: PartialEq<T> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &[T]) -> Option<Box<dyn Mismatch>> {
        if actual.iter().any(|item| self.needle == *item) {
            None
        } else {
            self.not_in(actual)
        }
    }
}

impl<T, N> Matcher<Vec<T>> for Contains<N>
where
    T: fmt::Debug,
    N: PartialEq<T> + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &Vec<T>) -> Option<Box<dyn Mismatch>> {
        Matcher::<[T]>::match_value(self, actual.as_slice())
    }
}

/// Matches sequences of an exact length: `len([1, 2]) != 3` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasLength {
    expected: usize,
}

impl HasLength {
    /// Creates the matcher for length `expected`.
    #[must_use]
    pub const fn new(expected: usize) -> Self {
        Self { expected }
    }
}

impl fmt::Display for HasLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HasLength({})", self.expected)
    }
}

impl HasLength {
    fn check<V: fmt::Debug + ?Sized>(&self, len: usize, values: &V) -> Option<Box<dyn Mismatch>> {
        if len == self.expected {
            None
        } else {
            fail(format!("len({values:?}) != {}", self.expected))
        }
    }
}

impl<T: fmt::Debug> Matcher<[T]> for HasLength {
    fn match_value(&self, actual: &[T]) -> Option<Box<dyn Mismatch>> {
        self.check(actual.len(), actual)
    }
}

impl<T: fmt::Debug> Matcher<Vec<T>> for HasLength {
    fn match_value(&self, actual: &Vec<T>) -> Option<Box<dyn Mismatch>> {
        self.check(actual.len(), actual)
    }
}

impl Matcher<str> for HasLength {
    fn match_value(&self, actual: &str) -> Option<Box<dyn Mismatch>> {
        self.check(actual.chars().count(), actual)
    }
}

impl Matcher<String> for HasLength {
    fn match_value(&self, actual: &String) -> Option<Box<dyn Mismatch>> {
        self.check(actual.chars().count(), actual)
    }
}

// =============================================================================
// MatchesRegex
// =============================================================================

bitflags! {
    /// Options applied when compiling a [`MatchesRegex`] pattern.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegexFlags: u8 {
        /// Letters match regardless of case.
        const CASE_INSENSITIVE = 1 << 0;
        /// `^` and `$` match at line boundaries.
        const MULTI_LINE = 1 << 1;
        /// `.` also matches `\n`.
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        /// Whitespace and `#` comments in the pattern are ignored.
        const IGNORE_WHITESPACE = 1 << 3;
    }
}

/// Matches text whose start matches a regular expression.
///
/// The pattern is anchored at the beginning of the candidate but not at the
/// end, so `MatchesRegex::new("a|b")` accepts `"apple"`. Failures describe
/// as `'c' does not match /a|b/`.
#[derive(Debug, Clone)]
pub struct MatchesRegex {
    pattern: String,
    flags: RegexFlags,
    regex: Regex,
}

impl MatchesRegex {
    /// Compiles `pattern` with no flags.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        Self::with_flags(pattern, RegexFlags::empty())
    }

    /// Compiles `pattern` with `flags`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn with_flags(pattern: impl Into<String>, flags: RegexFlags) -> Result<Self> {
        let pattern = pattern.into();
        // A trailing `#` comment would swallow the closing group in verbose mode.
        let anchored = if flags.contains(RegexFlags::IGNORE_WHITESPACE) {
            format!("\\A(?:{pattern}\n)")
        } else {
            format!("\\A(?:{pattern})")
        };
        let regex = RegexBuilder::new(&anchored)
            .case_insensitive(flags.contains(RegexFlags::CASE_INSENSITIVE))
            .multi_line(flags.contains(RegexFlags::MULTI_LINE))
            .dot_matches_new_line(flags.contains(RegexFlags::DOT_MATCHES_NEW_LINE))
            .ignore_whitespace(flags.contains(RegexFlags::IGNORE_WHITESPACE))
            .build()
            .map_err(|source| MatcherError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        Ok(Self {
            pattern,
            flags,
            regex,
        })
    }

    /// Returns the pattern as supplied.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the compile flags.
    #[must_use]
    pub const fn flags(&self) -> RegexFlags {
        self.flags
    }
}

impl fmt::Display for MatchesRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesRegex({}", text_repr(&self.pattern))?;
        if !self.flags.is_empty() {
            let names: Vec<&str> = self.flags.iter_names().map(|(name, _)| name).collect();
            write!(f, ", {}", names.join(" | "))?;
        }
        f.write_str(")")
    }
}

impl Matcher<str> for MatchesRegex {
    fn match_value(&self, actual: &str) -> Option<Box<dyn Mismatch>> {
        if self.regex.is_match(actual) {
            return None;
        }
        fail(format!(
            "{} does not match /{}/",
            text_repr(actual),
            escape_pattern(&self.pattern)
        ))
    }
}

impl Matcher<String> for MatchesRegex {
    fn match_value(&self, actual: &String) -> Option<Box<dyn Mismatch>> {
        Matcher::<str>::match_value(self, actual.as_str())
    }
}

// =============================================================================
// MatchesPredicate
// =============================================================================

/// Matches values for which a predicate returns `true`.
///
/// On failure every `{}` in the message is replaced with the candidate's
/// debug rendering.
///
/// ```rust
/// use matchkit::{Matcher, MatchesPredicate};
///
/// let is_even = MatchesPredicate::new(|x: &i32| x % 2 == 0, "{} is not even");
/// assert!(is_even.is_match(&4));
/// assert_eq!(is_even.match_value(&3).unwrap().describe(), "3 is not even");
/// ```
#[derive(Clone)]
pub struct MatchesPredicate<F> {
    predicate: F,
    message: String,
    name: String,
}

impl<F> MatchesPredicate<F> {
    /// Wraps `predicate` with a failure message template.
    pub fn new(predicate: F, message: impl Into<String>) -> Self {
        Self {
            predicate,
            message: message.into(),
            name: callable_repr::<F>(),
        }
    }

    /// Overrides the predicate name shown in the matcher's rendering.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> fmt::Debug for MatchesPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchesPredicate")
            .field("predicate", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

impl<F> fmt::Display for MatchesPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MatchesPredicate({}, {})",
            self.name,
            text_repr(&self.message)
        )
    }
}

impl<T, F> Matcher<T> for MatchesPredicate<F>
where
    T: fmt::Debug + ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        if (self.predicate)(actual) {
            return None;
        }
        fail(self.message.replace("{}", &format!("{actual:?}")))
    }
}
