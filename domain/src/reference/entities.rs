//! Resolution results for `@mentions`.

use super::token::ReferenceToken;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of candidates surfaced for an ambiguous mention.
pub const MAX_AMBIGUOUS_CANDIDATES: usize = 5;

/// Maximum number of suggestions attached to an unresolved mention.
pub const MAX_SUGGESTIONS: usize = 5;

/// Kind of entity a mention can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    File,
    Content,
    Section,
    Source,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::File => "file",
            ReferenceKind::Content => "content",
            ReferenceKind::Section => "section",
            ReferenceKind::Source => "source",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mention resolved to exactly one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedReference {
    File {
        id: String,
        token: ReferenceToken,
        name: String,
    },
    Content {
        id: String,
        token: ReferenceToken,
        slug: String,
        title: String,
        status: String,
    },
    Section {
        id: String,
        token: ReferenceToken,
        title: String,
        section_type: Option<String>,
        content_id: String,
        content_slug: String,
    },
    Source {
        id: String,
        token: ReferenceToken,
        external_id: String,
        title: String,
        status: String,
    },
}

impl ResolvedReference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            ResolvedReference::File { .. } => ReferenceKind::File,
            ResolvedReference::Content { .. } => ReferenceKind::Content,
            ResolvedReference::Section { .. } => ReferenceKind::Section,
            ResolvedReference::Source { .. } => ReferenceKind::Source,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResolvedReference::File { id, .. }
            | ResolvedReference::Content { id, .. }
            | ResolvedReference::Section { id, .. }
            | ResolvedReference::Source { id, .. } => id,
        }
    }

    pub fn token(&self) -> &ReferenceToken {
        match self {
            ResolvedReference::File { token, .. }
            | ResolvedReference::Content { token, .. }
            | ResolvedReference::Section { token, .. }
            | ResolvedReference::Source { token, .. } => token,
        }
    }

    /// Short human label used in prompts and CLI output.
    pub fn label(&self) -> String {
        match self {
            ResolvedReference::File { name, .. } => name.clone(),
            ResolvedReference::Content { title, slug, .. } => format!("{} ({})", title, slug),
            ResolvedReference::Section {
                title,
                content_slug,
                ..
            } => format!("{} in {}", title, content_slug),
            ResolvedReference::Source {
                title, external_id, ..
            } => format!("{} ({})", title, external_id),
        }
    }
}

/// A candidate offered to the user when a mention is ambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCandidate {
    pub kind: ReferenceKind,
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Canonical mention a client can insert to disambiguate (e.g. `@report-final.pdf`).
    pub reference: String,
    pub score: f64,
}

/// A mention that matched several entities equally well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousReference {
    pub token: ReferenceToken,
    pub candidates: Vec<ReferenceCandidate>,
}

/// Why a mention could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NotFound,
    SectionNotFound,
    Permission,
    Invalid,
}

impl UnresolvedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedReason::NotFound => "not_found",
            UnresolvedReason::SectionNotFound => "section_not_found",
            UnresolvedReason::Permission => "permission",
            UnresolvedReason::Invalid => "invalid",
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub token: ReferenceToken,
    pub reason: UnresolvedReason,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<ReferenceCandidate>,
}

impl UnresolvedReference {
    pub fn new(token: ReferenceToken, reason: UnresolvedReason) -> Self {
        Self {
            token,
            reason,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, mut suggestions: Vec<ReferenceCandidate>) -> Self {
        suggestions.truncate(MAX_SUGGESTIONS);
        self.suggestions = suggestions;
        self
    }
}

/// Everything the resolver learned about one message's mentions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub resolved: Vec<ResolvedReference>,
    pub unresolved: Vec<UnresolvedReference>,
    pub ambiguous: Vec<AmbiguousReference>,
}

impl ResolutionOutcome {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unresolved.is_empty() && self.ambiguous.is_empty()
    }

    /// Whether the user should be asked to clarify before mutations proceed.
    pub fn needs_clarification(&self) -> bool {
        !self.ambiguous.is_empty() || !self.unresolved.is_empty()
    }
}

// ==================== Lookup records ====================
//
// Rows returned by a reference lookup backend. They carry only what the
// resolver needs for matching and labelling.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub external_id: String,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "draft".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::token::parse_references;

    fn token(text: &str) -> ReferenceToken {
        parse_references(text).remove(0)
    }

    #[test]
    fn test_resolved_accessors() {
        let reference = ResolvedReference::Section {
            id: "sec_0".to_string(),
            token: token("@post#intro"),
            title: "Intro".to_string(),
            section_type: None,
            content_id: "c1".to_string(),
            content_slug: "post".to_string(),
        };
        assert_eq!(reference.kind(), ReferenceKind::Section);
        assert_eq!(reference.id(), "sec_0");
        assert_eq!(reference.token().identifier, "post");
        assert_eq!(reference.label(), "Intro in post");
    }

    #[test]
    fn test_suggestions_are_capped() {
        let candidate = ReferenceCandidate {
            kind: ReferenceKind::Section,
            id: "s".to_string(),
            label: "S".to_string(),
            subtitle: None,
            reference: "@post#s".to_string(),
            score: 0.1,
        };
        let unresolved = UnresolvedReference::new(token("@post#x"), UnresolvedReason::SectionNotFound)
            .with_suggestions(vec![candidate; 9]);
        assert_eq!(unresolved.suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&UnresolvedReason::SectionNotFound).unwrap();
        assert_eq!(json, "\"section_not_found\"");
    }

    #[test]
    fn test_outcome_clarification() {
        let mut outcome = ResolutionOutcome::default();
        assert!(outcome.is_empty());
        assert!(!outcome.needs_clarification());
        outcome
            .unresolved
            .push(UnresolvedReference::new(token("@x"), UnresolvedReason::NotFound));
        assert!(outcome.needs_clarification());
    }
}
