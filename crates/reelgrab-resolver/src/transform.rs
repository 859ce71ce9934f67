//! Provider response normalization.
//!
//! Every provider answers in its own shape. A `ResponseTransform` maps the raw
//! body to an optional `ExtractedMedia`; `None` means "this provider did not
//! give us anything usable" and the engine moves on.

use regex::Regex;
use std::fmt;

/// Media location and optional title pulled out of a provider response.
///
/// `media_url` may still be relative here; the descriptor absolutizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMedia {
    pub media_url: String,
    pub title: Option<String>,
}

#[derive(Clone)]
pub enum ResponseTransform {
    /// Parse the body as JSON and read string fields by JSON pointer
    /// (e.g. `/data/play`).
    JsonPointer {
        media: String,
        title: Option<String>,
    },
    /// Scan raw text for `"<key>":"<value>"` and unescape the value.
    TextPattern {
        media: QuotedField,
        title: Option<QuotedField>,
    },
    /// Provider-specific parsing that fits neither shape.
    Custom(fn(&str) -> Option<ExtractedMedia>),
}

impl fmt::Debug for ResponseTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseTransform::JsonPointer { media, title } => f
                .debug_struct("JsonPointer")
                .field("media", media)
                .field("title", title)
                .finish(),
            ResponseTransform::TextPattern { media, title } => f
                .debug_struct("TextPattern")
                .field("media", &media.key)
                .field("title", &title.as_ref().map(|t| &t.key))
                .finish(),
            ResponseTransform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ResponseTransform {
    pub fn json_pointer(media: impl Into<String>, title: Option<&str>) -> Self {
        ResponseTransform::JsonPointer {
            media: media.into(),
            title: title.map(str::to_string),
        }
    }

    pub fn text_pattern(key: impl Into<String>, title_key: Option<&str>) -> Self {
        ResponseTransform::TextPattern {
            media: QuotedField::new(key),
            title: title_key.map(QuotedField::new),
        }
    }

    pub fn apply(&self, body: &str) -> Option<ExtractedMedia> {
        match self {
            ResponseTransform::JsonPointer { media, title } => {
                let value: serde_json::Value = serde_json::from_str(body).ok()?;
                let media_url = non_empty(value.pointer(media)?.as_str()?)?;
                let title = title
                    .as_deref()
                    .and_then(|pointer| value.pointer(pointer))
                    .and_then(|v| v.as_str())
                    .and_then(non_empty);
                Some(ExtractedMedia { media_url, title })
            }
            ResponseTransform::TextPattern { media, title } => {
                let media_url = media.scan(body).and_then(|v| non_empty(&v))?;
                let title = title
                    .as_ref()
                    .and_then(|field| field.scan(body))
                    .and_then(|v| non_empty(&v));
                Some(ExtractedMedia { media_url, title })
            }
            ResponseTransform::Custom(parse) => parse(body),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A quoted JSON key to look for in raw text, with its pattern compiled once.
#[derive(Clone)]
pub struct QuotedField {
    key: String,
    pattern: Option<Regex>,
}

impl QuotedField {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let pattern = Regex::new(&format!(
            r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#,
            regex::escape(&key)
        ))
        .ok();
        Self { key, pattern }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// First `"key":"value"` in `body`, unescaped.
    fn scan(&self, body: &str) -> Option<String> {
        let captures = self.pattern.as_ref()?.captures(body)?;
        Some(unescape(captures.get(1)?.as_str()))
    }
}

impl fmt::Debug for QuotedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QuotedField").field(&self.key).finish()
    }
}

/// Undo JSON string escaping as providers embed it in page sources.
/// Unknown or malformed escapes are kept as written.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push_str("\\u"),
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
