//! Mutation scope derived from one message's resolved mentions.

use super::entities::ResolvedReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Entity ids a single chat turn may mutate.
///
/// Built from the current message only. Sources never grant scope: they are
/// read-only inputs. A scope is never persisted or merged with an earlier
/// turn's scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceScope {
    pub allowed_content_ids: BTreeSet<String>,
    pub allowed_section_ids: BTreeSet<String>,
    pub allowed_file_ids: BTreeSet<String>,
}

impl ReferenceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resolved(references: &[ResolvedReference]) -> Self {
        let mut scope = Self::new();
        for reference in references {
            match reference {
                ResolvedReference::Content { id, .. } => {
                    scope.allowed_content_ids.insert(id.clone());
                }
                ResolvedReference::Section { id, .. } => {
                    scope.allowed_section_ids.insert(id.clone());
                }
                ResolvedReference::File { id, .. } => {
                    scope.allowed_file_ids.insert(id.clone());
                }
                ResolvedReference::Source { .. } => {}
            }
        }
        scope
    }

    pub fn allows_content(&self, id: &str) -> bool {
        self.allowed_content_ids.contains(id)
    }

    pub fn allows_section(&self, id: &str) -> bool {
        self.allowed_section_ids.contains(id)
    }

    pub fn allows_file(&self, id: &str) -> bool {
        self.allowed_file_ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_content_ids.is_empty()
            && self.allowed_section_ids.is_empty()
            && self.allowed_file_ids.is_empty()
    }

    /// Whether every id in `self` is also allowed by `other`.
    pub fn is_subset(&self, other: &ReferenceScope) -> bool {
        self.allowed_content_ids.is_subset(&other.allowed_content_ids)
            && self.allowed_section_ids.is_subset(&other.allowed_section_ids)
            && self.allowed_file_ids.is_subset(&other.allowed_file_ids)
    }
}

/// Aggregate resolved mentions into a [`ReferenceScope`].
pub fn build_scope(references: &[ResolvedReference]) -> ReferenceScope {
    ReferenceScope::from_resolved(references)
}
