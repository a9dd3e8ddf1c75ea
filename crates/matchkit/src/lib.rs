#![forbid(unsafe_code)]
// Matcher names appear in prose constantly; backticking each one is noise.
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
//! # Matchkit
//!
//! Composable matchers for test assertions.
//!
//! A [`Matcher`] evaluates a candidate and returns either `None` (it
//! matched) or a [`Mismatch`] explaining the difference. Matchers are
//! stateless, so one instance can be reused across candidates and threads.
//!
//! Matchkit provides:
//! - **Leaf matchers**: `Equals`, `LessThan`, `Contains`, `HasLength`,
//!   `MatchesRegex`, `MatchesPredicate`, `DocTestMatches`
//! - **Combinators**: `Not`, `MatchesAll`, `MatchesAny`, `Annotate`,
//!   `AfterPreprocessing`, `AllMatch`
//! - **Structural matchers**: `MatchesStructure`, `MatchesDict`,
//!   `ContainsDict`, `ContainedByDict`, `KeysEqual`, `MatchesListwise`,
//!   `MatchesSetwise`
//! - **Deferred calls**: `Raises`, `MatchesException`, `MatchesPanic`
//! - **Filesystem**: `PathExists`, `DirExists`, `FileExists`,
//!   `DirContains`, `FileContains`, `HasPermissions`, `SamePath`,
//!   `TarballContains`
//!
//! ## Example
//!
//! ```rust
//! use matchkit::prelude::*;
//!
//! let matcher: MatchesAll<i32> = MatchesAll::new([
//!     GreaterThan::new(0).boxed(),
//!     Not::new(Equals::new(3)).boxed(),
//! ]);
//! assert!(assert_that(&5, &matcher).is_ok());
//!
//! let error = assert_that(&3, &matcher).unwrap_err();
//! assert_eq!(error.to_string(), "Differences: [\n3 matches Equals(3)\n]");
//! ```
//!
//! ## Failures that are not mismatches
//!
//! Building a matcher from bad input (an invalid regex, conflicting
//! options) returns a [`MatcherError`]. Panics from a callable under
//! [`Raises`] are resumed unless an inner matcher explicitly accepts them.

mod basic;
mod config;
mod content;
mod datastructures;
mod dict;
mod doctest;
mod error;
mod exception;
mod filesystem;
mod higher_order;
mod matcher;
mod mismatch;
pub mod repr;

pub use basic::{
    Contains, Equals, GreaterThan, HasLength, LessThan, MatchesPredicate, MatchesRegex, NotEquals,
    RegexFlags,
};
pub use config::{AssertConfig, VERBOSE_ENV, assert_that, assert_that_with};
pub use content::{Content, Details, TEXT_PLAIN};
pub use datastructures::{
    ByExample, ByMatcher, FieldMatcher, MatchesListwise, MatchesSetwise, MatchesStructure,
    contains_all,
};
pub use dict::{
    ContainedByDict, ContainsDict, KeysEqual, MapLike, MatchesAllDict, MatchesDict,
};
pub use doctest::{DocTestFlags, DocTestMatches};
pub use error::{MatcherError, MismatchError, Result};
pub use exception::{
    BoxError, MatchesException, MatchesPanic, Raised, Raises, infallible, raises,
};
#[cfg(unix)]
pub use filesystem::HasPermissions;
pub use filesystem::{
    DirContains, DirExists, FileContains, FileExists, PathExists, SamePath, TarballContains,
};
pub use higher_order::{AfterPreprocessing, AllMatch, Annotate, MatchesAll, MatchesAny, Not};
pub use matcher::{BoxMatcher, Matcher};
pub use mismatch::{AnnotatedMismatch, Mismatch, MismatchDecorator, MismatchesAll, SimpleMismatch};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::basic::{
        Contains, Equals, GreaterThan, HasLength, LessThan, MatchesPredicate, MatchesRegex,
        NotEquals,
    };
    pub use crate::config::{assert_that, assert_that_with};
    pub use crate::datastructures::{MatchesListwise, MatchesSetwise, MatchesStructure};
    pub use crate::dict::{ContainedByDict, ContainsDict, KeysEqual, MatchesDict};
    pub use crate::exception::{MatchesException, MatchesPanic, Raises, raises};
    pub use crate::higher_order::{AfterPreprocessing, AllMatch, Annotate, MatchesAll, MatchesAny, Not};
    pub use crate::matcher::{BoxMatcher, Matcher};
    pub use crate::mismatch::Mismatch;
}
