//! `@mention` tokenizer.
//!
//! Scans free text for `@identifier` spans, optionally followed by an anchor
//! (`@doc#section-id` or `@doc:Intro`). The tokenizer is a pure function of
//! its input; it never consults storage.
//!
//! # Rules
//!
//! - `@` starts a token only when preceded by a boundary (start of text,
//!   whitespace or one of [`LEADING_BOUNDARY`]) and followed by an ASCII
//!   alphanumeric character.
//! - The token runs to the next whitespace, then trailing punctuation from
//!   [`TRAILING_PUNCTUATION`] is stripped one character at a time, never
//!   below `@x`.
//! - The identifier is split at the first `#` or `:` after its first
//!   character, except for the reserved `source:` / `source/` prefixes.

use serde::{Deserialize, Serialize};

/// Characters (besides whitespace) allowed immediately before an `@`.
pub const LEADING_BOUNDARY: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'',
];

/// Characters stripped from the end of a token.
pub const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '#', ')', ']', '}', '"', '\''];

/// Identifier prefixes that address source entities and are never split.
pub const SOURCE_PREFIXES: &[&str] = &["source:", "source/"];

/// Separator that introduced an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorKind {
    /// `@doc#value`: matched against section ids first.
    Hash,
    /// `@doc:value`: matched against section titles and types first.
    Colon,
}

impl AnchorKind {
    pub fn separator(&self) -> char {
        match self {
            AnchorKind::Hash => '#',
            AnchorKind::Colon => ':',
        }
    }
}

/// Anchor part of a mention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceAnchor {
    pub kind: AnchorKind,
    pub value: String,
}

/// A parsed `@mention` span.
///
/// `start` and `end` are byte offsets into the original message; `start`
/// points at the `@` and `end` is exclusive, so `&message[start..end] == raw`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceToken {
    pub raw: String,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ReferenceAnchor>,
    pub start: usize,
    pub end: usize,
}

impl ReferenceToken {
    /// Whether the identifier addresses a source (`source:` / `source/`).
    pub fn is_source(&self) -> bool {
        has_source_prefix(&self.identifier)
    }
}

fn has_source_prefix(identifier: &str) -> bool {
    SOURCE_PREFIXES.iter().any(|p| identifier.starts_with(p))
}

fn is_leading_boundary(ch: char) -> bool {
    ch.is_whitespace() || LEADING_BOUNDARY.contains(&ch)
}

/// Extract every `@mention` from `message`, in order of appearance.
pub fn parse_references(message: &str) -> Vec<ReferenceToken> {
    let mut tokens = Vec::new();
    let mut prev: Option<char> = None;
    let mut pos = 0;

    while pos < message.len() {
        let Some(ch) = message[pos..].chars().next() else {
            break;
        };

        if ch == '@'
            && prev.is_none_or(is_leading_boundary)
            && message[pos + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            let token = scan_token(message, pos);
            pos = token.end;
            prev = token.raw.chars().last();
            tokens.push(token);
            continue;
        }

        prev = Some(ch);
        pos += ch.len_utf8();
    }

    tokens
}

/// Consume one token starting at the `@` located at byte `start`.
fn scan_token(message: &str, start: usize) -> ReferenceToken {
    let rest = &message[start..];
    let mut raw = match rest.find(char::is_whitespace) {
        Some(ws) => &rest[..ws],
        None => rest,
    };

    // Byte length of "@x" for the shortest allowed token; the character after
    // the `@` is ASCII so this is always 2.
    while raw.len() > 2 {
        match raw.chars().last() {
            Some(last) if TRAILING_PUNCTUATION.contains(&last) => {
                raw = &raw[..raw.len() - last.len_utf8()];
            }
            _ => break,
        }
    }

    let body = &raw[1..];
    let (identifier, anchor) = split_anchor(body);

    ReferenceToken {
        raw: raw.to_string(),
        identifier,
        anchor,
        start,
        end: start + raw.len(),
    }
}

fn split_anchor(body: &str) -> (String, Option<ReferenceAnchor>) {
    if has_source_prefix(body) {
        return (body.to_string(), None);
    }

    let split = body
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '#' || *c == ':');

    match split {
        Some((idx, sep)) => {
            let kind = if sep == '#' {
                AnchorKind::Hash
            } else {
                AnchorKind::Colon
            };
            (
                body[..idx].to_string(),
                Some(ReferenceAnchor {
                    kind,
                    value: body[idx + 1..].to_string(),
                }),
            )
        }
        None => (body.to_string(), None),
    }
}
