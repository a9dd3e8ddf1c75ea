//! Mismatch reports.
//!
//! A [`Mismatch`] is what a matcher hands back when a candidate fails. It is
//! built eagerly but described lazily: composite mismatches keep their
//! children and only produce text when [`Mismatch::describe`] is called.

use std::fmt;

use crate::content::{Content, Details};

/// Width above which a binary comparison switches to the multi-line layout.
const BINARY_INLINE_LIMIT: usize = 70;

/// A single failed match.
pub trait Mismatch: fmt::Debug + Send + Sync {
    /// Returns a human-readable explanation of the failure.
    fn describe(&self) -> String;

    /// Returns named diagnostic attachments.
    fn details(&self) -> Details {
        Details::new()
    }
}

impl<M: Mismatch + ?Sized> Mismatch for Box<M> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn details(&self) -> Details {
        (**self).details()
    }
}

/// Shorthand for a failed match with a fixed description.
pub(crate) fn fail(description: impl Into<String>) -> Option<Box<dyn Mismatch>> {
    Some(Box::new(SimpleMismatch::new(description)))
}

// =============================================================================
// SimpleMismatch
// =============================================================================

/// A mismatch with a fixed description and optional details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleMismatch {
    description: String,
    details: Details,
}

impl SimpleMismatch {
    /// Creates a mismatch with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            details: Details::new(),
        }
    }

    /// Replaces the attached details.
    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Attaches a single named piece of content.
    #[must_use]
    pub fn with_detail(mut self, name: impl Into<String>, content: Content) -> Self {
        self.details.insert(name.into(), content);
        self
    }
}

impl Mismatch for SimpleMismatch {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn details(&self) -> Details {
        self.details.clone()
    }
}

// =============================================================================
// MismatchDecorator
// =============================================================================

/// Wraps another mismatch and forwards everything to it.
///
/// Useful as a base when a mismatch needs to be re-typed or tagged without
/// changing what it reports.
pub struct MismatchDecorator {
    original: Box<dyn Mismatch>,
}

impl MismatchDecorator {
    /// Wraps `original`.
    pub fn new(original: Box<dyn Mismatch>) -> Self {
        Self { original }
    }

    /// Returns the wrapped mismatch.
    #[must_use]
    pub fn original(&self) -> &dyn Mismatch {
        self.original.as_ref()
    }

    /// Unwraps the decorator.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn Mismatch> {
        self.original
    }
}

impl fmt::Debug for MismatchDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MismatchDecorator({:?})>", self.original)
    }
}

impl Mismatch for MismatchDecorator {
    fn describe(&self) -> String {
        self.original.describe()
    }

    fn details(&self) -> Details {
        self.original.details()
    }
}

// =============================================================================
// AnnotatedMismatch
// =============================================================================

/// A mismatch with a trailing annotation: `"<inner>: <annotation>"`.
#[derive(Debug)]
pub struct AnnotatedMismatch {
    annotation: String,
    mismatch: Box<dyn Mismatch>,
}

impl AnnotatedMismatch {
    /// Annotates `mismatch` with `annotation`.
    pub fn new(annotation: impl Into<String>, mismatch: Box<dyn Mismatch>) -> Self {
        Self {
            annotation: annotation.into(),
            mismatch,
        }
    }

    /// Returns the annotation text.
    #[must_use]
    pub fn annotation(&self) -> &str {
        &self.annotation
    }
}

impl Mismatch for AnnotatedMismatch {
    fn describe(&self) -> String {
        format!("{}: {}", self.mismatch.describe(), self.annotation)
    }

    fn details(&self) -> Details {
        self.mismatch.details()
    }
}

// =============================================================================
// MismatchesAll
// =============================================================================

/// A list of mismatches reported together.
///
/// Wrapped (the default) it describes as:
///
/// ```text
/// Differences: [
/// <first>
/// <second>
/// ]
/// ```
#[derive(Debug)]
pub struct MismatchesAll {
    mismatches: Vec<Box<dyn Mismatch>>,
    wrap: bool,
}

impl MismatchesAll {
    /// Collects `mismatches` under a `Differences: [...]` header.
    pub fn new(mismatches: Vec<Box<dyn Mismatch>>) -> Self {
        Self {
            mismatches,
            wrap: true,
        }
    }

    /// Joins the mismatch descriptions with newlines and no header.
    pub fn unwrapped(mismatches: Vec<Box<dyn Mismatch>>) -> Self {
        Self {
            mismatches,
            wrap: false,
        }
    }

    /// Returns the collected mismatches.
    #[must_use]
    pub fn mismatches(&self) -> &[Box<dyn Mismatch>] {
        &self.mismatches
    }
}

impl Mismatch for MismatchesAll {
    fn describe(&self) -> String {
        let mut lines = Vec::with_capacity(self.mismatches.len() + 2);
        if self.wrap {
            lines.push("Differences: [".to_string());
        }
        lines.extend(self.mismatches.iter().map(|m| m.describe()));
        if self.wrap {
            lines.push("]".to_string());
        }
        lines.join("\n")
    }
}

// =============================================================================
// BinaryMismatch
// =============================================================================

/// Two rendered values that failed a binary comparison.
#[derive(Debug, Clone)]
pub(crate) struct BinaryMismatch {
    expected: String,
    operator: &'static str,
    actual: String,
}

impl BinaryMismatch {
    pub(crate) fn new(expected: String, operator: &'static str, actual: String) -> Self {
        Self {
            expected,
            operator,
            actual,
        }
    }
}

impl Mismatch for BinaryMismatch {
    fn describe(&self) -> String {
        if self.expected.chars().count() + self.actual.chars().count() > BINARY_INLINE_LIMIT {
            format!(
                "{}:\nreference = {}\nactual    = {}\n",
                self.operator, self.expected, self.actual
            )
        } else {
            format!("{} {} {}", self.expected, self.operator, self.actual)
        }
    }
}
