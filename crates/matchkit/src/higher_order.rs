//! Combinators: matchers built out of other matchers.

use std::fmt;
use std::marker::PhantomData;

use crate::matcher::{BoxMatcher, Matcher, join_matchers};
use crate::mismatch::{AnnotatedMismatch, Mismatch, MismatchesAll, fail};
use crate::repr::{callable_repr, text_repr};

// =============================================================================
// Not
// =============================================================================

/// Inverts a matcher: succeeds exactly when the inner matcher fails.
#[derive(Debug, Clone)]
pub struct Not<M> {
    matcher: M,
}

impl<M> Not<M> {
    /// Inverts `matcher`.
    pub const fn new(matcher: M) -> Self {
        Self { matcher }
    }
}

impl<M: fmt::Display> fmt::Display for Not<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not({})", self.matcher)
    }
}

impl<T, M> Matcher<T> for Not<M>
where
    T: fmt::Debug + ?Sized,
    M: Matcher<T>,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        match self.matcher.match_value(actual) {
            Some(_) => None,
            None => fail(format!("{actual:?} matches {}", self.matcher)),
        }
    }
}

// =============================================================================
// MatchesAll / MatchesAny
// =============================================================================

/// Succeeds when every child matcher succeeds.
///
/// By default every child is evaluated and all failures are reported in a
/// `Differences: [...]` list. With [`first_only`](Self::first_only) the first
/// failing child's mismatch is returned as-is.
pub struct MatchesAll<T: ?Sized> {
    matchers: Vec<BoxMatcher<T>>,
    first_only: bool,
}

impl<T: ?Sized> MatchesAll<T> {
    /// Combines `matchers`.
    pub fn new(matchers: impl IntoIterator<Item = BoxMatcher<T>>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
            first_only: false,
        }
    }

    /// Stops at, and reports only, the first failing child.
    #[must_use]
    pub const fn first_only(mut self) -> Self {
        self.first_only = true;
        self
    }
}

impl<T: ?Sized> fmt::Display for MatchesAll<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesAll({})", join_matchers(&self.matchers))
    }
}

impl<T: ?Sized> Matcher<T> for MatchesAll<T> {
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        let mut mismatches = Vec::new();
        for matcher in &self.matchers {
            if let Some(mismatch) = matcher.match_value(actual) {
                if self.first_only {
                    return Some(mismatch);
                }
                mismatches.push(mismatch);
            }
        }
        if mismatches.is_empty() {
            None
        } else {
            Some(Box::new(MismatchesAll::new(mismatches)))
        }
    }
}

/// Succeeds when at least one child matcher succeeds.
pub struct MatchesAny<T: ?Sized> {
    matchers: Vec<BoxMatcher<T>>,
}

impl<T: ?Sized> MatchesAny<T> {
    /// Combines `matchers`.
    pub fn new(matchers: impl IntoIterator<Item = BoxMatcher<T>>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
        }
    }
}

impl<T: ?Sized> fmt::Display for MatchesAny<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesAny({})", join_matchers(&self.matchers))
    }
}

impl<T: ?Sized> Matcher<T> for MatchesAny<T> {
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        let mut mismatches = Vec::with_capacity(self.matchers.len());
        for matcher in &self.matchers {
            match matcher.match_value(actual) {
                None => return None,
                Some(mismatch) => mismatches.push(mismatch),
            }
        }
        Some(Box::new(MismatchesAll::new(mismatches)))
    }
}

// =============================================================================
// Annotate
// =============================================================================

/// Appends a fixed message to the inner matcher's mismatch description.
#[derive(Debug, Clone)]
pub struct Annotate<M> {
    annotation: String,
    matcher: M,
}

impl<M> Annotate<M> {
    /// Annotates `matcher` with `annotation`.
    pub fn new(annotation: impl Into<String>, matcher: M) -> Self {
        Self {
            annotation: annotation.into(),
            matcher,
        }
    }

    /// Annotates `matcher` only when `annotation` is non-empty.
    pub fn if_message<T>(annotation: &str, matcher: M) -> BoxMatcher<T>
    where
        T: ?Sized,
        M: Matcher<T> + 'static,
    {
        if annotation.is_empty() {
            Box::new(matcher)
        } else {
            Box::new(Self::new(annotation, matcher))
        }
    }
}

impl<M: fmt::Display> fmt::Display for Annotate<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Annotate({}, {})", text_repr(&self.annotation), self.matcher)
    }
}

impl<T, M> Matcher<T> for Annotate<M>
where
    T: ?Sized,
    M: Matcher<T>,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        let mismatch = self.matcher.match_value(actual)?;
        Some(Box::new(AnnotatedMismatch::new(
            self.annotation.clone(),
            mismatch,
        )))
    }
}

// =============================================================================
// AfterPreprocessing
// =============================================================================

/// Applies a function to the candidate before handing it to a matcher.
///
/// Failures are annotated with `after <function> on <candidate>` unless
/// annotation is turned off.
///
/// ```rust
/// use matchkit::{AfterPreprocessing, Equals, Matcher};
///
/// fn parity(x: &i32) -> i32 {
///     x % 2
/// }
///
/// let is_odd = AfterPreprocessing::new(parity, Equals::new(1));
/// assert!(is_odd.is_match(&3));
/// assert_eq!(
///     is_odd.match_value(&2).unwrap().describe(),
///     "1 != 0: after <function parity> on 2"
/// );
/// ```
pub struct AfterPreprocessing<F, M, U> {
    preprocessor: F,
    matcher: M,
    name: String,
    annotate: bool,
    output: PhantomData<fn() -> U>,
}

impl<F, M, U> AfterPreprocessing<F, M, U> {
    /// Feeds `preprocessor(candidate)` to `matcher`.
    pub fn new<T>(preprocessor: F, matcher: M) -> Self
    where
        T: ?Sized,
        F: Fn(&T) -> U,
    {
        Self {
            preprocessor,
            matcher,
            name: callable_repr::<F>(),
            annotate: true,
            output: PhantomData,
        }
    }

    /// Overrides the function name shown in descriptions.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reports the inner mismatch without the `after ... on ...` suffix.
    #[must_use]
    pub const fn without_annotation(mut self) -> Self {
        self.annotate = false;
        self
    }
}

impl<F, M: fmt::Display, U> fmt::Display for AfterPreprocessing<F, M, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AfterPreprocessing({}, {})", self.name, self.matcher)
    }
}

impl<T, U, F, M> Matcher<T> for AfterPreprocessing<F, M, U>
where
    T: fmt::Debug + ?Sized,
    F: Fn(&T) -> U + Send + Sync,
    M: Matcher<U>,
{
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        let processed = (self.preprocessor)(actual);
        let mismatch = self.matcher.match_value(&processed)?;
        if !self.annotate {
            return Some(mismatch);
        }
        Some(Box::new(AnnotatedMismatch::new(
            format!("after {} on {actual:?}", self.name),
            mismatch,
        )))
    }
}

// =============================================================================
// AllMatch
// =============================================================================

/// Succeeds when every element of a sequence matches the inner matcher.
#[derive(Debug, Clone)]
pub struct AllMatch<M> {
    matcher: M,
}

impl<M> AllMatch<M> {
    /// Applies `matcher` to each element.
    pub const fn new(matcher: M) -> Self {
        Self { matcher }
    }
}

impl<M: fmt::Display> fmt::Display for AllMatch<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AllMatch({})", self.matcher)
    }
}

impl<T, M: Matcher<T>> Matcher<[T]> for AllMatch<M> {
    fn match_value(&self, actual: &[T]) -> Option<Box<dyn Mismatch>> {
        let mismatches: Vec<_> = actual
            .iter()
            .filter_map(|item| self.matcher.match_value(item))
            .collect();
        if mismatches.is_empty() {
            None
        } else {
            Some(Box::new(MismatchesAll::new(mismatches)))
        }
    }
}

impl<T, M: Matcher<T>> Matcher<Vec<T>> for AllMatch<M> {
    fn match_value(&self, actual: &Vec<T>) -> Option<Box<dyn Mismatch>> {
        Matcher::<[T]>::match_value(self, actual.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Equals, LessThan, NotEquals};

    fn describe<T: ?Sized, M: Matcher<T>>(matcher: &M, actual: &T) -> Option<String> {
        matcher.match_value(actual).map(|m| m.describe())
    }

    fn parity(x: &i32) -> i32 {
        x % 2
    }

    #[test]
    fn not_inverts() {
        let matcher = Not::new(Equals::new(1));
        assert_eq!(describe(&matcher, &2), None);
        assert_eq!(
            describe(&matcher, &1),
            Some("1 matches Equals(1)".into())
        );
        assert_eq!(matcher.to_string(), "Not(Equals(1))");
    }

    #[test]
    fn matches_all_collects_differences() {
        let matcher: MatchesAll<i32> =
            MatchesAll::new([NotEquals::new(1).boxed(), NotEquals::new(2).boxed()]);
        assert_eq!(describe(&matcher, &3), None);
        assert_eq!(
            describe(&matcher, &1),
            Some("Differences: [\n1 == 1\n]".into())
        );
        assert_eq!(
            matcher.to_string(),
            "MatchesAll(NotEquals(1), NotEquals(2))"
        );
    }

    #[test]
    fn matches_all_first_only_returns_first_mismatch() {
        let matcher: MatchesAll<i32> =
            MatchesAll::new([Equals::new(1).boxed(), Equals::new(2).boxed()]).first_only();
        assert_eq!(describe(&matcher, &3), Some("1 != 3".into()));
    }

    #[test]
    fn matches_any_succeeds_on_any() {
        let matcher: MatchesAny<i32> =
            MatchesAny::new([Equals::new(1).boxed(), Equals::new(2).boxed()]);
        assert_eq!(describe(&matcher, &2), None);
        assert_eq!(
            describe(&matcher, &3),
            Some("Differences: [\n1 != 3\n2 != 3\n]".into())
        );
        assert_eq!(matcher.to_string(), "MatchesAny(Equals(1), Equals(2))");
    }

    #[test]
    fn annotate_appends_message() {
        let matcher = Annotate::new("foo", Equals::new(1));
        assert_eq!(describe(&matcher, &1), None);
        assert_eq!(describe(&matcher, &2), Some("1 != 2: foo".into()));
        assert_eq!(matcher.to_string(), "Annotate('foo', Equals(1))");
    }

    #[test]
    fn annotate_if_message_skips_empty() {
        let plain: BoxMatcher<i32> = Annotate::if_message("", Equals::new(1));
        assert_eq!(plain.to_string(), "Equals(1)");
        let annotated: BoxMatcher<i32> = Annotate::if_message("foo", Equals::new(1));
        assert_eq!(annotated.to_string(), "Annotate('foo', Equals(1))");
    }

    #[test]
    fn after_preprocessing_annotates() {
        let matcher = AfterPreprocessing::new(parity, Equals::new(1));
        assert_eq!(describe(&matcher, &3), None);
        assert_eq!(
            describe(&matcher, &2),
            Some("1 != 0: after <function parity> on 2".into())
        );
        assert_eq!(
            matcher.to_string(),
            "AfterPreprocessing(<function parity>, Equals(1))"
        );
    }

    #[test]
    fn after_preprocessing_without_annotation() {
        let matcher = AfterPreprocessing::new(parity, Equals::new(1)).without_annotation();
        assert_eq!(describe(&matcher, &2), Some("1 != 0".into()));
    }

    #[test]
    fn after_preprocessing_named_closure() {
        let matcher =
            AfterPreprocessing::new(|s: &String| s.len(), Equals::new(3_usize)).named("len");
        assert_eq!(
            describe(&matcher, &"ab".to_string()),
            Some("3 != 2: after len on \"ab\"".into())
        );
    }

    #[test]
    fn all_match_reports_each_failure() {
        let matcher = AllMatch::new(LessThan::new(10));
        assert_eq!(describe(&matcher, &vec![1, 2, 3]), None);
        assert_eq!(
            describe(&matcher, &vec![9, 11, 10]),
            Some("Differences: [\n10 is not > 11\n10 is not > 10\n]".into())
        );
        assert_eq!(matcher.to_string(), "AllMatch(LessThan(10))");
    }
}
