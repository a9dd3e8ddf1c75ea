//! Rendering helpers shared by matcher descriptions.

use std::fmt::Write as _;

/// Renders text as a single-line quoted literal, e.g. `'foo\n'`.
///
/// Single quotes are used unless the text contains a single quote and no
/// double quote. Backslashes, the chosen quote and control characters are
/// escaped; other characters are kept as-is.
#[must_use]
pub fn text_repr(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => push_code_point(&mut out, c),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Renders a regex pattern for display between slashes.
///
/// Backslashes are kept verbatim so `\d` stays `\d`; whitespace escapes and
/// non-ASCII characters are spelled out as escape sequences.
#[must_use]
pub fn escape_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => push_code_point(&mut out, c),
        }
    }
    out
}

fn push_code_point(out: &mut String, ch: char) {
    let code = u32::from(ch);
    // Writing into a String cannot fail.
    let _ = if code <= 0xff {
        write!(out, "\\x{code:02x}")
    } else if code <= 0xffff {
        write!(out, "\\u{code:04x}")
    } else {
        write!(out, "\\U{code:08x}")
    };
}

/// Renders a callable type as `<function name>` or `<closure in name>`.
///
/// The name is taken from [`std::any::type_name`] with module paths and
/// generic arguments stripped.
#[must_use]
pub fn callable_repr<F: ?Sized>() -> String {
    let full = strip_generics(std::any::type_name::<F>());
    let segments: Vec<&str> = full.split("::").collect();
    match segments.last() {
        Some(&"{{closure}}") => {
            let owner = segments
                .iter()
                .rev()
                .find(|segment| **segment != "{{closure}}")
                .copied()
                .unwrap_or("?");
            format!("<closure in {owner}>")
        }
        Some(name) => format!("<function {name}>"),
        None => "<function ?>".to_string(),
    }
}

/// Shortens a type name by dropping module paths, including inside generic
/// arguments: `alloc::boxed::Box<dyn core::error::Error>` becomes
/// `Box<dyn Error>`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(ch);
        if !(ch.is_alphanumeric() || ch == '_') {
            segment_start = out.len();
        }
    }
    out
}

fn strip_generics(name: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
