//! Lookup queries handed to reference backends.
//!
//! Backends match candidates by case-insensitive substring. SQL stores use
//! [`LookupQuery::like_pattern`] with `ILIKE ... ESCAPE '\'`; in-memory
//! stores use [`LookupQuery::matches`].

use super::matching::CANDIDATE_LIMIT;

/// An organization-scoped substring lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub organization_id: String,
    pub needle: String,
    pub limit: usize,
}

impl LookupQuery {
    pub fn new(organization_id: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            needle: needle.into(),
            limit: CANDIDATE_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// `%needle%` with LIKE metacharacters in the needle escaped.
    pub fn like_pattern(&self) -> String {
        format!("%{}%", escape_like(&self.needle))
    }

    /// Case-insensitive substring test, the in-memory reading of
    /// [`like_pattern`](Self::like_pattern).
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.needle.to_lowercase())
    }
}

/// Escape `%`, `_` and `\` so they match literally in a LIKE pattern.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
