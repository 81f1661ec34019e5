//! Request-body validation for thread and reply forms.
//!
//! Every text field must be present, non-empty after trimming, and free of
//! markup. A field is free of markup when stripping all tags, decoding
//! entities and escaping the remaining text (`&`, `<`, `>`) reproduces the
//! input exactly. Already-escaped text such as `&amp;` therefore passes,
//! while a bare `&` does not.
//!
//! All failing fields are reported together:
//!
//! ```text
//! "thread.title" is not allowed to be empty, "thread.content" must not include HTML!
//! ```

use std::borrow::Cow;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Matches elements whose text is dropped with them, comments, and any
/// other opening or closing tag.
const TAG_PATTERN: &str = r"(?is)<(script|style|textarea|noscript)\b[^>]*>.*?</(script|style|textarea|noscript)\s*>|<!--.*?-->|<[!?/]?[a-z][^>]*>";

/// One or more invalid form fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .messages.join(", "))]
pub struct ValidationError {
    messages: Vec<String>,
}

impl ValidationError {
    /// The individual field messages, in form order.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Raw thread form, as posted by `threads/new` and `threads/edit`.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadPayload {
    #[serde(rename = "thread[title]")]
    pub title: Option<String>,
    #[serde(rename = "thread[content]")]
    pub content: Option<String>,
}

/// Raw reply form.
#[derive(Debug, Default, Deserialize)]
pub struct ReplyPayload {
    #[serde(rename = "reply[replyContent]")]
    pub reply_content: Option<String>,
}

/// A thread form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidThread {
    pub title: String,
    pub content: String,
}

/// A reply form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReply {
    pub content: String,
}

/// Validates forum content. Built once at start-up and shared through
/// `AppState`.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    tags: Regex,
}

impl ContentValidator {
    /// Compile the validator.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if the tag pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(TAG_PATTERN)?,
        })
    }

    /// Validate a thread create or edit form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` listing every invalid field.
    pub fn thread(&self, payload: &ThreadPayload) -> Result<ValidThread, ValidationError> {
        let mut messages = Vec::new();
        let title = self.field("thread.title", payload.title.as_deref(), &mut messages);
        let content = self.field("thread.content", payload.content.as_deref(), &mut messages);

        match (title, content) {
            (Some(title), Some(content)) if messages.is_empty() => Ok(ValidThread { title, content }),
            _ => Err(ValidationError { messages }),
        }
    }

    /// Validate a reply form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the reply text is invalid.
    pub fn reply(&self, payload: &ReplyPayload) -> Result<ValidReply, ValidationError> {
        let mut messages = Vec::new();
        self.field(
            "reply.replyContent",
            payload.reply_content.as_deref(),
            &mut messages,
        )
        .map(|content| ValidReply { content })
        .ok_or(ValidationError { messages })
    }

    /// Strip tags, decode entities and escape what remains, the way an HTML
    /// sanitizer with no allowed tags would.
    #[must_use]
    pub fn sanitize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let text = self.tags.replace_all(value, "");
        let decoded = html_escape::decode_html_entities(&text);
        match html_escape::encode_text(&decoded) {
            Cow::Borrowed(escaped) if escaped == value => Cow::Borrowed(value),
            escaped => Cow::Owned(escaped.into_owned()),
        }
    }

    /// Whether the value survives sanitizing unchanged.
    #[must_use]
    pub fn is_markup_free(&self, value: &str) -> bool {
        self.sanitize(value) == value
    }

    fn field(&self, label: &str, value: Option<&str>, messages: &mut Vec<String>) -> Option<String> {
        let Some(value) = value else {
            messages.push(format!("\"{label}\" is required"));
            return None;
        };

        let value = value.trim();
        if value.is_empty() {
            messages.push(format!("\"{label}\" is not allowed to be empty"));
            return None;
        }

        if !self.is_markup_free(value) {
            messages.push(format!("\"{label}\" must not include HTML!"));
            return None;
        }

        Some(value.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn validator() -> ContentValidator {
        ContentValidator::new().unwrap()
    }

    fn thread(title: Option<&str>, content: Option<&str>) -> ThreadPayload {
        ThreadPayload {
            title: title.map(String::from),
            content: content.map(String::from),
        }
    }

    #[test]
    fn test_valid_thread_is_trimmed() {
        let valid = validator()
            .thread(&thread(Some("  Borrow checker "), Some("Why does it hate me?")))
            .unwrap();
        assert_eq!(valid.title, "Borrow checker");
        assert_eq!(valid.content, "Why does it hate me?");
    }

    #[test]
    fn test_script_tag_is_rejected() {
        let err = validator()
            .thread(&thread(Some("Hi"), Some("<script>x</script>")))
            .unwrap_err();
        assert_eq!(err.to_string(), "\"thread.content\" must not include HTML!");
    }

    #[test]
    fn test_plain_text_of_same_length_is_accepted() {
        let plain = "a".repeat("<script>x</script>".len());
        assert!(validator().thread(&thread(Some("Hi"), Some(&plain))).is_ok());
    }

    #[test]
    fn test_all_failures_are_joined() {
        let err = validator()
            .thread(&thread(None, Some("   ")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"thread.title\" is required, \"thread.content\" is not allowed to be empty"
        );
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_reply_messages_use_reply_label() {
        let v = validator();
        let missing = v.reply(&ReplyPayload::default()).unwrap_err();
        assert_eq!(missing.to_string(), "\"reply.replyContent\" is required");

        let html = v
            .reply(&ReplyPayload {
                reply_content: Some("<b>bold</b>".to_string()),
            })
            .unwrap_err();
        assert_eq!(html.to_string(), "\"reply.replyContent\" must not include HTML!");
    }

    #[test]
    fn test_sanitize_strips_tags_and_escapes() {
        let v = validator();
        assert_eq!(v.sanitize("<p>hi</p>"), "hi");
        assert_eq!(v.sanitize("a<script>alert(1)</script>b"), "ab");
        assert_eq!(v.sanitize("x <!-- note --> y"), "x  y");
        assert_eq!(v.sanitize("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn test_bare_angle_brackets_and_ampersands_count_as_markup() {
        let v = validator();
        assert!(!v.is_markup_free("1 < 2"));
        assert!(!v.is_markup_free("Q&A"));
        assert!(v.is_markup_free("fn main() { println!(\"hi\"); }"));
    }

    #[test]
    fn test_escaped_entities_pass_unchanged() {
        let v = validator();
        assert_eq!(v.sanitize("Q&amp;A"), "Q&amp;A");
        assert!(v.is_markup_free("Q&amp;A"));
        assert!(v.is_markup_free("Vec&lt;u8&gt;"));
        assert!(!v.is_markup_free("&lt;b&gt;x</b>"));

        let reply = v.reply(&ReplyPayload {
            reply_content: Some("Tom &amp; Jerry".to_string()),
        });
        assert_eq!(reply.map(|r| r.content).ok().as_deref(), Some("Tom &amp; Jerry"));
    }

    #[test]
    fn test_form_field_names_deserialize() {
        let payload: ThreadPayload = serde_json::from_value(serde_json::json!({
            "thread[title]": "t",
            "thread[content]": "c",
        }))
        .unwrap();
        assert_eq!(payload.title.as_deref(), Some("t"));
        assert_eq!(payload.content.as_deref(), Some("c"));
    }
}
