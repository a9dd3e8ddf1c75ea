//! Doctest-style comparison of program output.

use std::fmt;

use bitflags::bitflags;

use crate::matcher::Matcher;
use crate::mismatch::{Mismatch, fail};
use crate::repr::text_repr;

const BLANKLINE_MARKER: &str = "<BLANKLINE>";
const ELLIPSIS_MARKER: &str = "...";

bitflags! {
    /// Comparison options for [`DocTestMatches`].
    ///
    /// Bit values follow the classic doctest option constants so flag sets
    /// render the same way (`flags=8` is `ELLIPSIS`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DocTestFlags: u32 {
        /// `True`/`False` output does not satisfy an expected `1`/`0`.
        const DONT_ACCEPT_TRUE_FOR_1 = 1;
        /// `<BLANKLINE>` in the example is taken literally.
        const DONT_ACCEPT_BLANKLINE = 2;
        /// Runs of whitespace compare equal.
        const NORMALIZE_WHITESPACE = 4;
        /// `...` in the example matches any text.
        const ELLIPSIS = 8;
    }
}

/// Matches text against a doctest-style example.
///
/// Both the example and the candidate are treated as ending in a newline.
///
/// ```rust
/// use matchkit::{DocTestFlags, DocTestMatches, Matcher};
///
/// let matcher = DocTestMatches::with_flags("Ran ... tests", DocTestFlags::ELLIPSIS);
/// assert!(matcher.is_match("Ran 42 tests"));
/// assert_eq!(
///     DocTestMatches::new("foo").match_value("bar").unwrap().describe(),
///     "Expected:\n    foo\nGot:\n    bar\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTestMatches {
    want: String,
    flags: DocTestFlags,
}

impl DocTestMatches {
    /// Creates a matcher for `example` with no option flags.
    pub fn new(example: impl Into<String>) -> Self {
        Self::with_flags(example, DocTestFlags::empty())
    }

    /// Creates a matcher for `example` with `flags`.
    pub fn with_flags(example: impl Into<String>, flags: DocTestFlags) -> Self {
        Self {
            want: with_newline(example.into()),
            flags,
        }
    }

    /// The expected output, newline-terminated.
    #[must_use]
    pub fn want(&self) -> &str {
        &self.want
    }

    /// The option flags.
    #[must_use]
    pub const fn flags(&self) -> DocTestFlags {
        self.flags
    }

    fn check_output(&self, got: &str) -> bool {
        let want = self.want.as_str();
        if got == want {
            return true;
        }
        if !self.flags.contains(DocTestFlags::DONT_ACCEPT_TRUE_FOR_1)
            && matches!((got, want), ("True\n", "1\n") | ("False\n", "0\n"))
        {
            return true;
        }

        let (want, got) = if self.flags.contains(DocTestFlags::DONT_ACCEPT_BLANKLINE) {
            (want.to_string(), got.to_string())
        } else {
            let want = strip_blankline_markers(want);
            let got = blank_whitespace_lines(got);
            if got == want {
                return true;
            }
            (want, got)
        };

        let (want, got) = if self.flags.contains(DocTestFlags::NORMALIZE_WHITESPACE) {
            let want = normalize_whitespace(&want);
            let got = normalize_whitespace(&got);
            if got == want {
                return true;
            }
            (want, got)
        } else {
            (want, got)
        };

        self.flags.contains(DocTestFlags::ELLIPSIS) && ellipsis_match(&want, &got)
    }

    fn describe_difference(&self, got: &str) -> String {
        let got = if self.flags.contains(DocTestFlags::DONT_ACCEPT_BLANKLINE) {
            got.to_string()
        } else {
            mark_blank_lines(got)
        };
        match (self.want.is_empty(), got.is_empty()) {
            (false, false) => format!("Expected:\n{}Got:\n{}", indent(&self.want), indent(&got)),
            (false, true) => format!("Expected:\n{}Got nothing\n", indent(&self.want)),
            (true, false) => format!("Expected nothing\nGot:\n{}", indent(&got)),
            (true, true) => "Expected nothing\nGot nothing\n".to_string(),
        }
    }
}

impl fmt::Display for DocTestMatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocTestMatches({}", text_repr(&self.want))?;
        if !self.flags.is_empty() {
            write!(f, ", flags={}", self.flags.bits())?;
        }
        f.write_str(")")
    }
}

impl Matcher<str> for DocTestMatches {
    fn match_value(&self, actual: &str) -> Option<Box<dyn Mismatch>> {
        let got = with_newline(actual.to_string());
        if self.check_output(&got) {
            return None;
        }
        fail(self.describe_difference(&got))
    }
}

impl Matcher<String> for DocTestMatches {
    fn match_value(&self, actual: &String) -> Option<Box<dyn Mismatch>> {
        Matcher::<str>::match_value(self, actual.as_str())
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Rewrites each line of `text` with `f`, preserving line terminators.
fn map_lines(text: &str, f: impl Fn(&str) -> Option<&str>) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, newline) = line
            .strip_suffix('\n')
            .map_or((line, ""), |body| (body, "\n"));
        out.push_str(f(body).unwrap_or(body));
        out.push_str(newline);
    }
    out
}

/// Empties example lines that consist of a `<BLANKLINE>` marker.
fn strip_blankline_markers(want: &str) -> String {
    map_lines(want, |line| {
        line.strip_prefix(BLANKLINE_MARKER)
            .filter(|rest| rest.chars().all(char::is_whitespace))
            .map(|_| "")
    })
}

/// Empties output lines made only of whitespace.
fn blank_whitespace_lines(got: &str) -> String {
    map_lines(got, |line| {
        (!line.is_empty() && line.chars().all(char::is_whitespace)).then_some("")
    })
}

/// Shows blank output lines as `<BLANKLINE>` in failure reports.
fn mark_blank_lines(got: &str) -> String {
    let mut out = String::with_capacity(got.len());
    for line in got.split_inclusive('\n') {
        match line.strip_suffix('\n') {
            Some(body) if body.chars().all(|c| c == ' ') => {
                out.push_str(BLANKLINE_MARKER);
                out.push('\n');
            }
            _ => out.push_str(line),
        }
    }
    out
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Indents every non-empty line by four spaces.
fn indent(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line == "\n" {
                line.to_string()
            } else {
                format!("    {line}")
            }
        })
        .collect()
}

/// Matches `got` against `want`, where each `...` in `want` matches any
/// (possibly empty) run of text.
fn ellipsis_match(want: &str, got: &str) -> bool {
    if !want.contains(ELLIPSIS_MARKER) {
        return want == got;
    }
    let mut pieces: Vec<&str> = want.split(ELLIPSIS_MARKER).collect();
    let mut start = 0;
    let mut end = got.len();

    if let Some(first) = pieces.first().copied()
        && !first.is_empty()
    {
        if !got.starts_with(first) {
            return false;
        }
        start = first.len();
        pieces.remove(0);
    }
    if let Some(last) = pieces.last().copied()
        && !last.is_empty()
    {
        if !got.ends_with(last) {
            return false;
        }
        end -= last.len();
        pieces.pop();
    }
    if start > end {
        return false;
    }

    for piece in pieces {
        match got[start..end].find(piece) {
            Some(offset) => start += offset + piece.len(),
            None => return false,
        }
    }
    true
}
