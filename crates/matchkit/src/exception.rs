//! Matching failures raised by deferred calls.
//!
//! A deferred call is any `Fn() -> Result<R, E>`. [`Raises`] invokes it and
//! captures how it failed as a [`Raised`] value: either the returned error
//! or a caught panic. Inner matchers such as [`MatchesException`] and
//! [`MatchesPanic`] then inspect that value.
//!
//! Panics are the non-recoverable tier. Unless an inner matcher positively
//! accepts a panic, [`Raises`] resumes unwinding instead of reporting a
//! mismatch.

use std::any::{Any, type_name};
use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::basic::MatchesRegex;
use crate::error::{MatcherError, Result};
use crate::matcher::{BoxMatcher, Matcher};
use crate::mismatch::{Mismatch, fail};
use crate::repr::{callable_repr, short_type_name, text_repr};

/// An owned error as captured from a deferred call.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

// =============================================================================
// Raised
// =============================================================================

/// How a deferred call failed.
pub enum Raised {
    /// The call returned `Err`.
    Error {
        /// Full type name of the error as returned.
        type_name: &'static str,
        /// The error itself.
        error: BoxError,
    },
    /// The call panicked; holds the panic payload.
    Panic(Box<dyn Any + Send + 'static>),
}

impl Raised {
    /// Wraps a returned error, remembering its static type.
    pub fn from_error<E: Into<BoxError>>(error: E) -> Self {
        Self::Error {
            type_name: type_name::<E>(),
            error: error.into(),
        }
    }

    /// Returns `true` for a caught panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }

    /// Short type name of what was raised; `panic` for panics.
    #[must_use]
    pub fn kind(&self) -> String {
        match self {
            Self::Error { type_name, .. } => short_type_name(type_name),
            Self::Panic(_) => "panic".to_string(),
        }
    }

    /// Downcasts the error or panic payload to `E`.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Error { error, .. } => error.downcast_ref::<E>(),
            Self::Panic(payload) => payload.downcast_ref::<E>(),
        }
    }

    /// The error's `Display` text, or the panic message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Error { error, .. } => error.to_string(),
            Self::Panic(payload) => panic_message(payload.as_ref()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(error) = payload.downcast_ref::<MatcherError>() {
        error.to_string()
    } else {
        "<non-string panic payload>".to_string()
    }
}

impl fmt::Debug for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { error, .. } => write!(f, "{error:?}"),
            Self::Panic(payload) => write!(f, "panic({:?})", panic_message(payload.as_ref())),
        }
    }
}

// =============================================================================
// MatchesException
// =============================================================================

enum ErrorCheck<E> {
    Type,
    Message(MatchesRegex),
    Matcher(BoxMatcher<E>),
}

/// Matches a [`Raised`] error (or panic payload) of type `E`.
///
/// Without refinement any `E` matches. The refinements compare it by
/// value, run a regex over its `Display` text, or apply an arbitrary
/// matcher to it.
pub struct MatchesException<E> {
    check: ErrorCheck<E>,
    rendering: String,
    error_type: PhantomData<fn() -> E>,
}

impl<E: Error + Send + Sync + 'static> MatchesException<E> {
    /// Matches any error of type `E`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            check: ErrorCheck::Type,
            rendering: short_type_name(type_name::<E>()),
            error_type: PhantomData,
        }
    }

    /// Matches an error of type `E` equal to `expected`.
    pub fn with_value(expected: E) -> Self
    where
        E: PartialEq + fmt::Debug,
    {
        let rendering = format!("{expected:?}");
        Self {
            check: ErrorCheck::Matcher(Box::new(SameArguments { expected })),
            rendering,
            error_type: PhantomData,
        }
    }

    /// Matches an error of type `E` whose message matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn with_message(pattern: &str) -> Result<Self> {
        let regex = MatchesRegex::new(pattern)?;
        Ok(Self {
            check: ErrorCheck::Message(regex),
            rendering: format!(
                "{}, {}",
                short_type_name(type_name::<E>()),
                text_repr(pattern)
            ),
            error_type: PhantomData,
        })
    }

    /// Matches an error of type `E` accepted by `matcher`.
    pub fn with_matcher(matcher: impl Matcher<E> + 'static) -> Self {
        let rendering = format!("{}, {matcher}", short_type_name(type_name::<E>()));
        Self {
            check: ErrorCheck::Matcher(Box::new(matcher)),
            rendering,
            error_type: PhantomData,
        }
    }
}

impl<E: Error + Send + Sync + 'static> Default for MatchesException<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Display for MatchesException<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesException({})", self.rendering)
    }
}

impl<E: Error + Send + Sync + 'static> Matcher<Raised> for MatchesException<E> {
    fn match_value(&self, actual: &Raised) -> Option<Box<dyn Mismatch>> {
        let Some(error) = actual.downcast_ref::<E>() else {
            return fail(format!(
                "{} is not a {}",
                actual.kind(),
                short_type_name(type_name::<E>())
            ));
        };
        match &self.check {
            ErrorCheck::Type => None,
            ErrorCheck::Message(regex) => regex.match_value(&error.to_string()),
            ErrorCheck::Matcher(matcher) => matcher.match_value(error),
        }
    }
}

/// Equality check reported as `<actual> has different arguments to <expected>.`
struct SameArguments<E> {
    expected: E,
}

impl<E: fmt::Debug> fmt::Display for SameArguments<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.expected)
    }
}

impl<E: PartialEq + fmt::Debug + Send + Sync> Matcher<E> for SameArguments<E> {
    fn match_value(&self, actual: &E) -> Option<Box<dyn Mismatch>> {
        if *actual == self.expected {
            return None;
        }
        fail(format!(
            "{actual:?} has different arguments to {:?}.",
            self.expected
        ))
    }
}

// =============================================================================
// MatchesPanic
// =============================================================================

/// Matches a caught panic, optionally by message.
#[derive(Debug, Clone, Default)]
pub struct MatchesPanic {
    message: Option<MatchesRegex>,
}

impl MatchesPanic {
    /// Matches any panic.
    #[must_use]
    pub const fn new() -> Self {
        Self { message: None }
    }

    /// Matches a panic whose message matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidPattern`] when the pattern does not
    /// compile.
    pub fn with_message(pattern: &str) -> Result<Self> {
        Ok(Self {
            message: Some(MatchesRegex::new(pattern)?),
        })
    }
}

impl fmt::Display for MatchesPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(regex) => write!(f, "MatchesPanic({})", text_repr(regex.pattern())),
            None => f.write_str("MatchesPanic()"),
        }
    }
}

impl Matcher<Raised> for MatchesPanic {
    fn match_value(&self, actual: &Raised) -> Option<Box<dyn Mismatch>> {
        if !actual.is_panic() {
            return fail(format!("{} is not a panic", actual.kind()));
        }
        self.message
            .as_ref()
            .and_then(|regex| regex.match_value(&actual.message()))
    }
}

// =============================================================================
// Raises
// =============================================================================

/// Matches a deferred call that fails.
///
/// The call runs under [`std::panic::catch_unwind`]. Returning `Ok` is a
/// mismatch. A returned `Err` matches when there is no inner matcher or the
/// inner matcher accepts it. A panic matches only when an inner matcher
/// accepts it; otherwise unwinding resumes.
///
/// ```rust
/// use std::num::ParseIntError;
/// use matchkit::{Matcher, MatchesException, Raises, raises};
///
/// let parse = || "x".parse::<i32>();
/// assert!(Raises::new().is_match(&parse));
/// assert!(raises(MatchesException::<ParseIntError>::new()).is_match(&parse));
///
/// let ok = || "1".parse::<i32>();
/// let mismatch = Raises::new().match_value(&ok).unwrap();
/// assert!(mismatch.describe().ends_with("returned 1 without raising"));
/// ```
#[derive(Default)]
pub struct Raises {
    matcher: Option<BoxMatcher<Raised>>,
}

impl Raises {
    /// Matches any returned error.
    #[must_use]
    pub const fn new() -> Self {
        Self { matcher: None }
    }

    /// Requires the captured failure to satisfy `matcher`.
    #[must_use]
    pub fn matching(mut self, matcher: impl Matcher<Raised> + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }
}

impl fmt::Display for Raises {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Some(matcher) => write!(f, "Raises({matcher})"),
            None => f.write_str("Raises()"),
        }
    }
}

impl<F, R, E> Matcher<F> for Raises
where
    F: Fn() -> std::result::Result<R, E>,
    R: fmt::Debug,
    E: Into<BoxError>,
{
    fn match_value(&self, actual: &F) -> Option<Box<dyn Mismatch>> {
        let raised = match panic::catch_unwind(AssertUnwindSafe(actual)) {
            Ok(Ok(value)) => {
                return fail(format!(
                    "{} returned {value:?} without raising",
                    callable_repr::<F>()
                ));
            }
            Ok(Err(error)) => Raised::from_error(error),
            Err(payload) => Raised::Panic(payload),
        };

        let mismatch = match &self.matcher {
            Some(matcher) => matcher.match_value(&raised),
            None if raised.is_panic() => fail("unexpected panic"),
            None => None,
        };
        let mismatch = mismatch?;
        if let Raised::Panic(payload) = raised {
            debug!(
                callable = %callable_repr::<F>(),
                message = %panic_message(payload.as_ref()),
                "resuming unmatched panic"
            );
            panic::resume_unwind(payload);
        }
        Some(mismatch)
    }
}

/// Shorthand for `Raises::new().matching(matcher)`.
pub fn raises(matcher: impl Matcher<Raised> + 'static) -> Raises {
    Raises::new().matching(matcher)
}

/// Adapts a plain callable into a deferred call that never returns `Err`,
/// so [`Raises`] can observe its panics.
pub fn infallible<F, R>(callable: F) -> impl Fn() -> std::result::Result<R, Infallible>
where
    F: Fn() -> R,
{
    move || Ok(callable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Equals;
    use crate::higher_order::AfterPreprocessing;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    enum LookupError {
        #[error("no such key: {0}")]
        Missing(String),
        #[error("lookup cancelled")]
        Cancelled,
    }

    fn missing(key: &str) -> impl Fn() -> std::result::Result<i32, LookupError> + '_ {
        move || Err(LookupError::Missing(key.to_string()))
    }

    fn describe<T: ?Sized, M: Matcher<T>>(matcher: &M, actual: &T) -> Option<String> {
        matcher.match_value(actual).map(|m| m.describe())
    }

    #[test]
    fn raises_matches_returned_error() {
        assert_eq!(describe(&Raises::new(), &missing("a")), None);
    }

    #[test]
    fn raises_reports_normal_return() {
        fn answer() -> std::result::Result<i32, LookupError> {
            Ok(42)
        }
        assert_eq!(
            describe(&Raises::new(), &answer),
            Some("<function answer> returned 42 without raising".into())
        );
    }

    #[test]
    fn matches_exception_by_type() {
        let matcher = raises(MatchesException::<LookupError>::new());
        assert_eq!(describe(&matcher, &missing("a")), None);

        let wrong = raises(MatchesException::<std::fmt::Error>::new());
        assert_eq!(
            describe(&wrong, &missing("a")),
            Some("LookupError is not a Error".into())
        );
    }

    #[test]
    fn matches_exception_by_value() {
        let matcher = raises(MatchesException::with_value(LookupError::Missing("a".into())));
        assert_eq!(describe(&matcher, &missing("a")), None);
        assert_eq!(
            describe(&matcher, &missing("b")),
            Some("Missing(\"b\") has different arguments to Missing(\"a\").".into())
        );
        assert_eq!(
            matcher.to_string(),
            "Raises(MatchesException(Missing(\"a\")))"
        );
    }

    #[test]
    fn matches_exception_by_message() {
        let matcher = MatchesException::<LookupError>::with_message("no such key: [ab]$").unwrap();
        assert_eq!(matcher.to_string(), "MatchesException(LookupError, 'no such key: [ab]$')");
        let matcher = raises(matcher);
        assert_eq!(describe(&matcher, &missing("a")), None);
        assert_eq!(
            describe(&matcher, &missing("c")),
            Some("'no such key: c' does not match /no such key: [ab]$/".into())
        );
    }

    #[test]
    fn matches_exception_with_matcher() {
        let is_cancelled = AfterPreprocessing::new(
            |e: &LookupError| matches!(e, LookupError::Cancelled),
            Equals::new(true),
        )
        .named("is_cancelled");
        let matcher = raises(MatchesException::<LookupError>::with_matcher(is_cancelled));
        let cancelled = || -> std::result::Result<(), LookupError> { Err(LookupError::Cancelled) };
        assert_eq!(describe(&matcher, &cancelled), None);
        assert_eq!(
            describe(&matcher, &missing("a")),
            Some("true != false: after is_cancelled on Missing(\"a\")".into())
        );
    }

    #[test]
    fn matched_panic_is_swallowed() {
        let boom = infallible(|| -> i32 { panic!("boom") });
        assert_eq!(describe(&raises(MatchesPanic::new()), &boom), None);
        let by_message = raises(MatchesPanic::with_message("bo+m").unwrap());
        assert_eq!(describe(&by_message, &boom), None);
    }

    #[test]
    fn unmatched_panic_resumes() {
        let boom = infallible(|| -> i32 { panic!("boom") });
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            Raises::new().match_value(&boom).map(|m| m.describe())
        }));
        let payload = outcome.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn panic_with_wrong_message_resumes() {
        let boom = infallible(|| -> i32 { panic!("boom") });
        let matcher = raises(MatchesPanic::with_message("bang").unwrap());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| matcher.is_match(&boom)));
        assert!(outcome.is_err());
    }

    #[test]
    fn matches_panic_rejects_errors() {
        let matcher = raises(MatchesPanic::new());
        assert_eq!(
            describe(&matcher, &missing("a")),
            Some("LookupError is not a panic".into())
        );
    }

    #[test]
    fn raised_accessors() {
        let raised = Raised::from_error(LookupError::Cancelled);
        assert!(!raised.is_panic());
        assert_eq!(raised.kind(), "LookupError");
        assert_eq!(raised.message(), "lookup cancelled");
        assert_eq!(
            raised.downcast_ref::<LookupError>(),
            Some(&LookupError::Cancelled)
        );
        assert_eq!(format!("{raised:?}"), "Cancelled");

        let panic = Raised::Panic(Box::new("oops"));
        assert!(panic.is_panic());
        assert_eq!(panic.kind(), "panic");
        assert_eq!(format!("{panic:?}"), "panic(\"oops\")");
    }

    #[test]
    fn display_forms() {
        assert_eq!(Raises::new().to_string(), "Raises()");
        assert_eq!(
            raises(MatchesException::<LookupError>::new()).to_string(),
            "Raises(MatchesException(LookupError))"
        );
        assert_eq!(MatchesPanic::new().to_string(), "MatchesPanic()");
    }
}
