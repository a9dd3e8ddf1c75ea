//! Matchers for key-value mappings.
//!
//! [`MatchesDict`], [`ContainsDict`] and [`ContainedByDict`] all compare a
//! candidate map against a map of per-key matchers. They differ only in
//! which of the three report sections they produce:
//!
//! | matcher           | `Differences` | `Extra` | `Missing` |
//! |-------------------|:-------------:|:-------:|:---------:|
//! | `MatchesDict`     | yes           | yes     | yes       |
//! | `ContainsDict`    | yes           | no      | yes       |
//! | `ContainedByDict` | yes           | yes     | no        |
//!
//! Each section is emitted only when non-empty; keys are sorted inside a
//! section and sections appear in label order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::matcher::{BoxMatcher, Matcher};
use crate::mismatch::{AnnotatedMismatch, BinaryMismatch, Mismatch, SimpleMismatch};

/// Read access to a key-value mapping, for the dict matchers.
pub trait MapLike {
    /// Key type.
    type Key: Ord + fmt::Debug;
    /// Value type.
    type Value;

    /// Looks up `key`.
    fn value_of(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Returns every key, sorted.
    fn sorted_keys(&self) -> Vec<&Self::Key>;
}

impl<K: Ord + fmt::Debug, V> MapLike for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn value_of(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn sorted_keys(&self) -> Vec<&K> {
        self.keys().collect()
    }
}

impl<K, V, S> MapLike for HashMap<K, V, S>
where
    K: Ord + Hash + fmt::Debug,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn value_of(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn sorted_keys(&self) -> Vec<&K> {
        let mut keys: Vec<&K> = self.keys().collect();
        keys.sort();
        keys
    }
}

// =============================================================================
// Mismatch shapes
// =============================================================================

/// Per-key mismatches rendered as `{\n  key: description,\n}`.
#[derive(Debug)]
struct KeyedMismatches {
    entries: Vec<(String, Box<dyn Mismatch>)>,
}

impl Mismatch for KeyedMismatches {
    fn describe(&self) -> String {
        let mut lines = Vec::with_capacity(self.entries.len() + 2);
        lines.push("{".to_string());
        for (key, mismatch) in &self.entries {
            lines.push(format!("  {key}: {},", mismatch.describe()));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// Labelled mismatches rendered one per line as `label: description`.
#[derive(Debug)]
struct LabelledMismatches {
    labelled: BTreeMap<String, Box<dyn Mismatch>>,
}

impl LabelledMismatches {
    fn into_mismatch(self) -> Option<Box<dyn Mismatch>> {
        if self.labelled.is_empty() {
            None
        } else {
            Some(Box::new(self))
        }
    }
}

impl Mismatch for LabelledMismatches {
    fn describe(&self) -> String {
        self.labelled
            .iter()
            .map(|(label, mismatch)| format!("{label}: {}", mismatch.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_matchers<K: fmt::Debug, V: ?Sized>(matchers: &BTreeMap<K, BoxMatcher<V>>) -> String {
    let entries: Vec<String> = matchers
        .iter()
        .map(|(key, matcher)| format!("{key:?}: {matcher}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

// =============================================================================
// Dict comparison
// =============================================================================

#[derive(Clone, Copy)]
struct Sections {
    extra: bool,
    missing: bool,
}

fn compare_dict<C, K, V>(
    expected: &BTreeMap<K, BoxMatcher<V>>,
    actual: &C,
    sections: Sections,
) -> Option<Box<dyn Mismatch>>
where
    C: MapLike<Key = K, Value = V> + ?Sized,
    K: Ord + fmt::Debug,
    V: fmt::Debug,
{
    let mut differences = Vec::new();
    let mut missing = Vec::new();
    for (key, matcher) in expected {
        match actual.value_of(key) {
            Some(value) => {
                if let Some(mismatch) = matcher.match_value(value) {
                    differences.push((format!("{key:?}"), mismatch));
                }
            }
            None => {
                let mismatch: Box<dyn Mismatch> = Box::new(SimpleMismatch::new(matcher.to_string()));
                missing.push((format!("{key:?}"), mismatch));
            }
        }
    }

    let mut extra = Vec::new();
    if sections.extra {
        for key in actual.sorted_keys() {
            if expected.contains_key(key) {
                continue;
            }
            if let Some(value) = actual.value_of(key) {
                let mismatch: Box<dyn Mismatch> = Box::new(SimpleMismatch::new(format!("{value:?}")));
                extra.push((format!("{key:?}"), mismatch));
            }
        }
    }

    let mut labelled = BTreeMap::new();
    let mut add = |label: &str, entries: Vec<(String, Box<dyn Mismatch>)>| {
        if !entries.is_empty() {
            let section: Box<dyn Mismatch> = Box::new(KeyedMismatches { entries });
            labelled.insert(label.to_string(), section);
        }
    };
    add("Differences", differences);
    if sections.extra {
        add("Extra", extra);
    }
    if sections.missing {
        add("Missing", missing);
    }
    LabelledMismatches { labelled }.into_mismatch()
}

macro_rules! dict_matcher {
    (
        $(#[$meta:meta])*
        $name:ident, extra: $extra:expr, missing: $missing:expr
    ) => {
        $(#[$meta])*
        pub struct $name<K, V: ?Sized> {
            expected: BTreeMap<K, BoxMatcher<V>>,
        }

        impl<K: Ord, V: ?Sized> $name<K, V> {
            /// Builds the matcher from `(key, matcher)` pairs.
            pub fn new(expected: impl IntoIterator<Item = (K, BoxMatcher<V>)>) -> Self {
                Self {
                    expected: expected.into_iter().collect(),
                }
            }
        }

        impl<K: fmt::Debug, V: ?Sized> fmt::Display for $name<K, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({})"),
                    render_matchers(&self.expected)
                )
            }
        }

        impl<C, K, V> Matcher<C> for $name<K, V>
        where
            C: MapLike<Key = K, Value = V> + ?Sized,
            K: Ord + fmt::Debug + Send + Sync,
            V: fmt::Debug,
        {
            fn match_value(&self, actual: &C) -> Option<Box<dyn Mismatch>> {
                compare_dict(
                    &self.expected,
                    actual,
                    Sections {
                        extra: $extra,
                        missing: $missing,
                    },
                )
            }
        }
    };
}

dict_matcher!(
    /// Matches a map whose keys are exactly the expected keys and whose
    /// values satisfy the per-key matchers.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use matchkit::{Equals, Matcher, MatchesDict};
    ///
    /// let matcher = MatchesDict::new([
    ///     ("foo", Equals::new(1).boxed()),
    ///     ("bar", Equals::new(2).boxed()),
    /// ]);
    /// let actual = BTreeMap::from([("foo", 1), ("baz", 3)]);
    /// assert_eq!(
    ///     matcher.match_value(&actual).unwrap().describe(),
    ///     "Extra: {\n  \"baz\": 3,\n}\nMissing: {\n  \"bar\": Equals(2),\n}"
    /// );
    /// ```
    MatchesDict, extra: true, missing: true
);

dict_matcher!(
    /// Matches a map that has at least the expected keys, each satisfying its
    /// matcher. Extra keys are ignored.
    ContainsDict, extra: false, missing: true
);

dict_matcher!(
    /// Matches a map whose keys are a subset of the expected keys, each
    /// satisfying its matcher. Absent expected keys are ignored.
    ContainedByDict, extra: true, missing: false
);

// =============================================================================
// KeysEqual
// =============================================================================

/// Matches a map whose key set equals the expected keys.
///
/// Failures describe as
/// `["bar", "foo"] does not match {...}: Keys not equal`.
#[derive(Debug, Clone)]
pub struct KeysEqual<K> {
    expected: Vec<K>,
}

impl<K: Ord> KeysEqual<K> {
    /// Expects exactly `keys`.
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            expected: keys.into_iter().collect(),
        }
    }

    /// Expects exactly the keys of `map`.
    pub fn from_map<C>(map: &C) -> Self
    where
        C: MapLike<Key = K> + ?Sized,
        K: Clone,
    {
        Self::new(map.sorted_keys().into_iter().cloned())
    }
}

impl<K: fmt::Debug> fmt::Display for KeysEqual<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.expected.iter().map(|k| format!("{k:?}")).collect();
        write!(f, "KeysEqual({})", keys.join(", "))
    }
}

impl<C, K> Matcher<C> for KeysEqual<K>
where
    C: MapLike<Key = K> + fmt::Debug + ?Sized,
    K: Ord + fmt::Debug + Send + Sync,
{
    fn match_value(&self, actual: &C) -> Option<Box<dyn Mismatch>> {
        let mut expected: Vec<&K> = self.expected.iter().collect();
        expected.sort();
        if actual.sorted_keys() == expected {
            return None;
        }
        Some(Box::new(AnnotatedMismatch::new(
            "Keys not equal",
            Box::new(BinaryMismatch::new(
                format!("{expected:?}"),
                "does not match",
                format!("{actual:?}"),
            )),
        )))
    }
}

// =============================================================================
// MatchesAllDict
// =============================================================================

/// Applies several labelled matchers to the same candidate.
///
/// Failures are listed one per line as `label: description`, in label
/// order.
pub struct MatchesAllDict<T: ?Sized> {
    matchers: BTreeMap<String, BoxMatcher<T>>,
}

impl<T: ?Sized> MatchesAllDict<T> {
    /// Builds the matcher from `(label, matcher)` pairs.
    pub fn new<L: Into<String>>(matchers: impl IntoIterator<Item = (L, BoxMatcher<T>)>) -> Self {
        Self {
            matchers: matchers
                .into_iter()
                .map(|(label, matcher)| (label.into(), matcher))
                .collect(),
        }
    }
}

impl<T: ?Sized> fmt::Display for MatchesAllDict<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchesAllDict({})", render_matchers(&self.matchers))
    }
}

impl<T: ?Sized> Matcher<T> for MatchesAllDict<T> {
    fn match_value(&self, actual: &T) -> Option<Box<dyn Mismatch>> {
        let labelled = self
            .matchers
            .iter()
            .filter_map(|(label, matcher)| {
                matcher
                    .match_value(actual)
                    .map(|mismatch| (label.clone(), mismatch))
            })
            .collect();
        LabelledMismatches { labelled }.into_mismatch()
    }
}
