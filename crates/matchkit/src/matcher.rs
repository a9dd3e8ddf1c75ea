//! The [`Matcher`] trait.

use std::fmt;

use crate::mismatch::Mismatch;

/// A reusable check against candidate values of type `T`.
///
/// Matchers are configuration only: evaluating one never mutates it, so the
/// same matcher may be shared across threads and applied any number of
/// times. The [`Display`](fmt::Display) impl is the matcher's canonical
/// rendering and shows up inside other matchers' descriptions, e.g.
/// `Not(Equals(1))`.
pub trait Matcher<T: ?Sized>: fmt::Display + Send + Sync {
    /// Evaluates `actual`, returning `None` on success.
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>>;

    /// Returns `true` when `actual` matches.
    fn is_match(&self, actual: &T) -> bool {
        self.match_value(actual).is_none()
    }

    /// Boxes the matcher for storage in a combinator.
    fn boxed(self) -> BoxMatcher<T>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// An owned, type-erased matcher.
pub type BoxMatcher<T> = Box<dyn Matcher<T>>;

impl<T: ?Sized, M: Matcher<T> + ?Sized> Matcher<T> for Box<M> {
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        (**self).match_value(actual)
    }
}

impl<T: ?Sized, M: Matcher<T> + ?Sized> Matcher<T> for &M {
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        (**self).match_value(actual)
    }
}

/// Renders a list of matchers as `A, B, C`.
pub(crate) fn join_matchers<T: ?Sized>(matchers: &[BoxMatcher<T>]) -> String {
    matchers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
