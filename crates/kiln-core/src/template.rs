//! Output filename templates.
//!
//! Supported placeholders: `[name]`, `[contenthash]`, `[contenthash:N]`,
//! `[hash]`, `[hash:N]`, `[ext]` and `[query]`. Hash placeholders render a
//! blake3 digest of the rendered content, truncated to `N` hex characters
//! (20 when `N` is omitted).

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Hash length used when a placeholder gives none.
pub const DEFAULT_HASH_LENGTH: usize = 20;

const MAX_HASH_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilenameTemplate {
    raw: Cow<'static, str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Name,
    Hash(usize),
    Ext,
    Query,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub name: &'a str,
    /// Bytes the content hash is computed from.
    pub content: &'a [u8],
    /// Extension including the leading dot, or empty.
    pub ext: &'a str,
    /// Query string including the leading `?`, or empty.
    pub query: &'a str,
}

impl FilenameTemplate {
    /// Parse and validate a template.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        segments(&raw)?;
        Ok(Self {
            raw: Cow::Owned(raw),
        })
    }

    /// Built-in template. Only used for literals known to be valid.
    pub(crate) const fn from_static(raw: &'static str) -> Self {
        Self {
            raw: Cow::Borrowed(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the rendered name depends on content.
    pub fn is_hashed(&self) -> bool {
        segments(&self.raw)
            .map(|segs| segs.iter().any(|s| matches!(s, Segment::Hash(_))))
            .unwrap_or(false)
    }

    pub fn render(&self, ctx: &TemplateContext<'_>) -> Result<String> {
        let mut out = String::with_capacity(self.raw.len() + 16);
        let mut digest: Option<String> = None;

        for segment in segments(&self.raw)? {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(ctx.name),
                Segment::Ext => out.push_str(ctx.ext),
                Segment::Query => out.push_str(ctx.query),
                Segment::Hash(len) => {
                    let full = digest.get_or_insert_with(|| content_hash(ctx.content, MAX_HASH_LENGTH));
                    out.push_str(&full[..len]);
                }
            }
        }

        Ok(out)
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for FilenameTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for FilenameTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FilenameTemplate::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Lowercase hex blake3 digest of `bytes`, truncated to `len` characters.
pub fn content_hash(bytes: &[u8], len: usize) -> String {
    let hex = blake3::hash(bytes).to_hex();
    hex.as_str()[..len.min(MAX_HASH_LENGTH)].to_string()
}

fn segments(raw: &str) -> Result<Vec<Segment<'_>>> {
    let mut out = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']') else {
            break;
        };
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        let token = &rest[open + 1..open + close];
        out.push(placeholder(raw, token)?);
        rest = &rest[open + close + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }

    Ok(out)
}

fn placeholder<'a>(raw: &str, token: &str) -> Result<Segment<'a>> {
    let invalid = || Error::InvalidTemplate {
        template: raw.to_string(),
        placeholder: token.to_string(),
    };

    let (key, len) = match token.split_once(':') {
        Some((key, len)) => {
            let len: usize = len.parse().map_err(|_| invalid())?;
            if len == 0 || len > MAX_HASH_LENGTH {
                return Err(invalid());
            }
            (key, Some(len))
        }
        None => (token, None),
    };

    match (key, len) {
        ("name", None) => Ok(Segment::Name),
        ("ext", None) => Ok(Segment::Ext),
        ("query", None) => Ok(Segment::Query),
        ("contenthash" | "hash", len) => Ok(Segment::Hash(len.unwrap_or(DEFAULT_HASH_LENGTH))),
        _ => Err(invalid()),
    }
}
