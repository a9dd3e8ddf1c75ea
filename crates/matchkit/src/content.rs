//! Typed diagnostic attachments.
//!
//! A [`Mismatch`](crate::Mismatch) can carry named pieces of [`Content`]
//! alongside its one-line description: a full file body, a captured log, a
//! rendered diff. Test runners decide how (or whether) to show them.

use std::collections::BTreeMap;
use std::fmt;

/// Named attachments on a mismatch, ordered by name.
pub type Details = BTreeMap<String, Content>;

/// Content type used by [`Content::text`].
pub const TEXT_PLAIN: &str = "text/plain; charset=utf8";

/// A blob of diagnostic data with a MIME-style content type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Content {
    content_type: String,
    body: Vec<u8>,
}

impl Content {
    /// Creates content from a raw body.
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Creates UTF-8 plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TEXT_PLAIN, text.into().into_bytes())
    }

    /// Returns the content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as text when the content is textual and valid UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if !self.content_type.starts_with("text/") {
            return None;
        }
        std::str::from_utf8(&self.body).ok()
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "Content({}, {text:?})", self.content_type),
            None => write!(
                f,
                "Content({}, <{} bytes>)",
                self.content_type,
                self.body.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_round_trips() {
        let content = Content::text("hello");
        assert_eq!(content.content_type(), TEXT_PLAIN);
        assert_eq!(content.as_text(), Some("hello"));
        assert_eq!(content.body(), b"hello");
    }

    #[test]
    fn binary_content_is_not_text() {
        let content = Content::new("application/octet-stream", vec![0xff, 0x00]);
        assert_eq!(content.as_text(), None);
        assert_eq!(
            format!("{content:?}"),
            "Content(application/octet-stream, <2 bytes>)"
        );
    }

    #[test]
    fn invalid_utf8_text_is_not_text() {
        let content = Content::new("text/plain", vec![0xff]);
        assert_eq!(content.as_text(), None);
    }
}
