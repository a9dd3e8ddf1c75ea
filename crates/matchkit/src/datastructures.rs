//! Matchers over sequences and structured values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::basic::{Contains, Equals, HasLength};
use crate::higher_order::{Annotate, MatchesAll};
use crate::matcher::{BoxMatcher, Matcher, join_matchers};
use crate::mismatch::{AnnotatedMismatch, Mismatch, MismatchesAll, fail};

/// Matches each position of `values` against the matcher at that position,
/// after checking that the lengths agree.
fn match_listwise<T: fmt::Debug>(
    matchers: &[&dyn Matcher<T>],
    values: &[&T],
    first_only: bool,
) -> Option<Box<dyn Mismatch>> {
    let mut mismatches = Vec::new();
    let length_check = Annotate::new("Length mismatch", HasLength::new(matchers.len()));
    if let Some(mismatch) = length_check.match_value(values) {
        mismatches.push(mismatch);
    }
    for (matcher, value) in matchers.iter().zip(values) {
        if let Some(mismatch) = matcher.match_value(*value) {
            if first_only {
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

// =============================================================================
// MatchesListwise
// =============================================================================

/// Matches a sequence element by element.
///
/// ```rust
/// use matchkit::{Equals, Matcher, MatchesListwise};
///
/// let matcher = MatchesListwise::new([Equals::new(1).boxed(), Equals::new(2).boxed()]);
/// assert!(matcher.is_match(&vec![1, 2]));
/// assert_eq!(
///     matcher.match_value(&vec![2, 1]).unwrap().describe(),
///     "Differences: [\n1 != 2\n2 != 1\n]"
/// );
/// ```
pub struct MatchesListwise<T> {
    matchers: Vec<BoxMatcher<T>>,
    first_only: bool,
}

impl<T> MatchesListwise<T> {
    /// Pairs `matchers` with candidate elements by position.
    pub fn new(matchers: impl IntoIterator<Item = BoxMatcher<T>>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
            first_only: false,
        }
    }

    /// Reports only the first positional mismatch.
    #[must_use]
    pub const fn first_only(mut self) -> Self {
        self.first_only = true;
        self
    }
}

impl<T> fmt::Display for MatchesListwise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesListwise([{}])", join_matchers(&self.matchers))
    }
}

impl<T: fmt::Debug> Matcher<[T]> for MatchesListwise<T> {
    fn match_value(&self, actual: &[T]) -> Option<Box<dyn Mismatch>> {
        let matchers: Vec<&dyn Matcher<T>> = self.matchers.iter().map(|m| &**m).collect();
        let values: Vec<&T> = actual.iter().collect();
        match_listwise(&matchers, &values, self.first_only)
    }
}

impl<T: fmt::Debug> Matcher<Vec<T>> for MatchesListwise<T> {
    fn match_value(&self, actual: &Vec<T>) -> Option<Box<dyn Mismatch>> {
        Matcher::<[T]>::match_value(self, actual.as_slice())
    }
}

// =============================================================================
// MatchesSetwise
// =============================================================================

/// Matches an unordered collection: every matcher must pair with a distinct
/// element and every element with a distinct matcher.
///
/// Pairing is a maximum bipartite matching, so the result never depends on
/// the order of the candidate's elements. When no perfect pairing exists the
/// leftover matchers and values are reported.
pub struct MatchesSetwise<T> {
    matchers: Vec<BoxMatcher<T>>,
}

impl<T> MatchesSetwise<T> {
    /// Pairs `matchers` with candidate elements in any order.
    pub fn new(matchers: impl IntoIterator<Item = BoxMatcher<T>>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
        }
    }
}

impl<T> fmt::Display for MatchesSetwise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesSetwise({})", join_matchers(&self.matchers))
    }
}

/// Augmenting-path search: tries to give `matcher` a value, displacing
/// earlier owners onto alternatives where possible.
fn augment(
    matcher: usize,
    compatible: &[Vec<bool>],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for value in 0..visited.len() {
        if !compatible[matcher][value] || visited[value] {
            continue;
        }
        visited[value] = true;
        let free = match owner[value] {
            None => true,
            Some(previous) => augment(previous, compatible, visited, owner),
        };
        if free {
            owner[value] = Some(matcher);
            return true;
        }
    }
    false
}

fn plural(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

impl<T: fmt::Debug> Matcher<[T]> for MatchesSetwise<T> {
    fn match_value(&self, actual: &[T]) -> Option<Box<dyn Mismatch>> {
        let compatible: Vec<Vec<bool>> = self
            .matchers
            .iter()
            .map(|matcher| actual.iter().map(|value| matcher.is_match(value)).collect())
            .collect();

        let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
        let mut assigned = vec![false; self.matchers.len()];
        for (index, slot) in assigned.iter_mut().enumerate() {
            let mut visited = vec![false; actual.len()];
            *slot = augment(index, &compatible, &mut visited, &mut owner);
        }

        let remaining: Vec<&dyn Matcher<T>> = self
            .matchers
            .iter()
            .zip(&assigned)
            .filter(|(_, assigned)| !**assigned)
            .map(|(matcher, _)| &**matcher)
            .collect();
        let not_matched: Vec<&T> = actual
            .iter()
            .zip(&owner)
            .filter(|(_, owner)| owner.is_none())
            .map(|(value, _)| value)
            .collect();

        if remaining.is_empty() && not_matched.is_empty() {
            return None;
        }
        trace!(
            leftover_matchers = remaining.len(),
            leftover_values = not_matched.len(),
            "setwise pairing incomplete"
        );

        let render = |matchers: &[&dyn Matcher<T>]| {
            matchers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        if not_matched.is_empty() {
            let lead = if remaining.len() == 1 {
                "There was 1 matcher left over".to_string()
            } else {
                format!("There were {} matchers left over", remaining.len())
            };
            return fail(format!("{lead}: {}", render(&remaining[..])));
        }
        if remaining.is_empty() {
            let lead = if not_matched.len() == 1 {
                "There was 1 value left over".to_string()
            } else {
                format!("There were {} values left over", not_matched.len())
            };
            return fail(format!("{lead}: {not_matched:?}"));
        }

        let common = remaining.len().min(not_matched.len());
        let mut message = if common == 1 {
            "There was 1 mismatch".to_string()
        } else {
            format!("There were {common} mismatches")
        };
        if remaining.len() > common {
            let extra = &remaining[common..];
            message.push_str(&format!(
                " and {}: {}",
                plural(extra.len(), "extra matcher"),
                render(extra)
            ));
        } else if not_matched.len() > common {
            let extra = &not_matched[common..];
            message.push_str(&format!(
                " and {}: {extra:?}",
                plural(extra.len(), "extra value")
            ));
        }
        match match_listwise(&remaining[..common], &not_matched[..common], false) {
            Some(mismatch) => Some(Box::new(AnnotatedMismatch::new(message, mismatch))),
            None => fail(message),
        }
    }
}

impl<T: fmt::Debug> Matcher<Vec<T>> for MatchesSetwise<T> {
    fn match_value(&self, actual: &Vec<T>) -> Option<Box<dyn Mismatch>> {
        Matcher::<[T]>::match_value(self, actual.as_slice())
    }
}

// =============================================================================
// ContainsAll
// =============================================================================

/// Matches a candidate that contains every one of `items`.
///
/// Equivalent to [`MatchesAll`] over one [`Contains`] per item, so every
/// missing item is reported.
pub fn contains_all<T, N>(items: impl IntoIterator<Item = N>) -> MatchesAll<T>
where
    T: ?Sized,
    N: 'static,
    Contains<N>: Matcher<T>,
{
    MatchesAll::new(
        items
            .into_iter()
            .map(|item| Box::new(Contains::new(item)) as BoxMatcher<T>),
    )
}

// =============================================================================
// MatchesStructure
// =============================================================================

/// One named field check inside a [`MatchesStructure`].
pub struct FieldMatcher<T: ?Sized> {
    check: Arc<dyn Fn(&T) -> Option<Box<dyn Mismatch>> + Send + Sync>,
    rendering: String,
}

impl<T: ?Sized> Clone for FieldMatcher<T> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
            rendering: self.rendering.clone(),
        }
    }
}

/// Matches a value field by field.
///
/// Each field is a projection from the candidate plus a matcher for the
/// projected value. Fields are evaluated in name order and every failing
/// field is reported, annotated with its name.
///
/// ```rust
/// use matchkit::{Equals, Matcher, MatchesStructure};
///
/// #[derive(Debug)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let matcher = MatchesStructure::new()
///     .field("x", |p: &Point| p.x, Equals::new(1))
///     .field("y", |p: &Point| p.y, Equals::new(2));
/// assert_eq!(matcher.to_string(), "MatchesStructure(x=Equals(1), y=Equals(2))");
/// assert_eq!(
///     matcher.match_value(&Point { x: 3, y: 2 }).unwrap().describe(),
///     "Differences: [\n1 != 3: x\n]"
/// );
/// ```
pub struct MatchesStructure<T: ?Sized> {
    fields: BTreeMap<String, FieldMatcher<T>>,
}

impl<T: ?Sized> Clone for MatchesStructure<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<T: ?Sized + 'static> Default for MatchesStructure<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> MatchesStructure<T> {
    /// Creates a structure matcher with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Builds a field check from a projection and a matcher.
    pub fn check<U, P, M>(projection: P, matcher: M) -> FieldMatcher<T>
    where
        U: 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
        M: Matcher<U> + 'static,
    {
        let rendering = matcher.to_string();
        FieldMatcher {
            check: Arc::new(move |value: &T| matcher.match_value(&projection(value))),
            rendering,
        }
    }

    /// Adds (or replaces) the check for field `name`.
    #[must_use]
    pub fn field<U, P, M>(mut self, name: impl Into<String>, projection: P, matcher: M) -> Self
    where
        U: 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
        M: Matcher<U> + 'static,
    {
        self.fields
            .insert(name.into(), Self::check(projection, matcher));
        self
    }

    /// Adds a field compared by equality to `expected`.
    #[must_use]
    pub fn equal_field<U, P>(self, name: impl Into<String>, projection: P, expected: U) -> Self
    where
        U: PartialEq + fmt::Debug + Send + Sync + 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.field(name, projection, Equals::new(expected))
    }

    /// Starts a structure matcher whose fields are compared by equality with
    /// the same fields of `example`.
    pub const fn from_example(example: &T) -> ByExample<'_, T> {
        ByExample {
            example,
            structure: Self { fields: BTreeMap::new() },
        }
    }

    /// Starts a structure matcher whose fields all use matchers made by
    /// `constructor` from an expected value.
    pub fn by_matcher<C>(constructor: C) -> ByMatcher<T, C> {
        ByMatcher {
            constructor,
            structure: Self::new(),
        }
    }

    /// Returns a copy with fields replaced, added or removed.
    ///
    /// `Some(check)` replaces or adds the named field; `None` drops it.
    #[must_use]
    pub fn update<N: Into<String>>(
        &self,
        changes: impl IntoIterator<Item = (N, Option<FieldMatcher<T>>)>,
    ) -> Self {
        let mut updated = self.clone();
        for (name, change) in changes {
            let name = name.into();
            match change {
                Some(check) => {
                    updated.fields.insert(name, check);
                }
                None => {
                    updated.fields.remove(&name);
                }
            }
        }
        updated
    }

    /// Names of the checked fields, in evaluation order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<T: ?Sized> fmt::Display for MatchesStructure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, field)| format!("{name}={}", field.rendering))
            .collect();
        write!(f, "MatchesStructure({})", fields.join(", "))
    }
}

impl<T: ?Sized> Matcher<T> for MatchesStructure<T> {
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        let mismatches: Vec<Box<dyn Mismatch>> = self
            .fields
            .iter()
            .filter_map(|(name, field)| {
                (field.check)(actual).map(|mismatch| {
                    Box::new(AnnotatedMismatch::new(name.clone(), mismatch)) as Box<dyn Mismatch>
                })
            })
            .collect();
        if mismatches.is_empty() {
            None
        } else {
            Some(Box::new(MismatchesAll::new(mismatches)))
        }
    }
}

/// Builder returned by [`MatchesStructure::from_example`].
pub struct ByExample<'a, T: ?Sized> {
    example: &'a T,
    structure: MatchesStructure<T>,
}

impl<T: ?Sized + 'static> ByExample<'_, T> {
    /// Compares field `name` by equality with the example's value.
    #[must_use]
    pub fn field<U, P>(mut self, name: impl Into<String>, projection: P) -> Self
    where
        U: PartialEq + fmt::Debug + Send + Sync + 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
    {
        let expected = projection(self.example);
        self.structure = self.structure.equal_field(name, projection, expected);
        self
    }

    /// Finishes the matcher.
    #[must_use]
    pub fn build(self) -> MatchesStructure<T> {
        self.structure
    }
}

/// Builder returned by [`MatchesStructure::by_matcher`].
pub struct ByMatcher<T: ?Sized, C> {
    constructor: C,
    structure: MatchesStructure<T>,
}

impl<T: ?Sized + 'static, C> ByMatcher<T, C> {
    /// Checks field `name` with `constructor(expected)`.
    #[must_use]
    pub fn field<U, V, M, P>(mut self, name: impl Into<String>, projection: P, expected: V) -> Self
    where
        C: Fn(V) -> M,
        U: 'static,
        M: Matcher<U> + 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
    {
        let matcher = (self.constructor)(expected);
        self.structure = self.structure.field(name, projection, matcher);
        self
    }

    /// Finishes the matcher.
    #[must_use]
    pub fn build(self) -> MatchesStructure<T> {
        self.structure
    }
}
