//! In-memory reference lookup over workspace fixtures.
//!
//! Matches with [`LookupQuery::matches`], the same case-insensitive
//! substring test a SQL backend runs with `ILIKE`.

use super::fixture::WorkspaceFixture;
use async_trait::async_trait;
use scribe_application::ports::reference_lookup::{LookupError, ReferenceLookupPort};
use scribe_domain::{ContentRecord, FileRecord, LookupQuery, SectionRecord, SourceRecord};
use std::collections::HashMap;
use tracing::debug;

/// Organization-keyed workspace snapshots.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceLookup {
    workspaces: HashMap<String, WorkspaceFixture>,
}

impl InMemoryReferenceLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, fixture: WorkspaceFixture) -> Self {
        self.workspaces
            .insert(fixture.organization_id.clone(), fixture);
        self
    }

    pub fn workspace(&self, organization_id: &str) -> Option<&WorkspaceFixture> {
        self.workspaces.get(organization_id)
    }

    /// Unknown organizations see nothing rather than an error, as a row
    /// filter on `organization_id` would.
    fn scoped(&self, query: &LookupQuery) -> Option<&WorkspaceFixture> {
        let workspace = self.workspaces.get(&query.organization_id);
        if workspace.is_none() {
            debug!("No workspace for organization {}", query.organization_id);
        }
        workspace
    }
}

fn matches_any(query: &LookupQuery, keys: &[&str]) -> bool {
    keys.iter().any(|key| query.matches(key))
}

#[async_trait]
impl ReferenceLookupPort for InMemoryReferenceLookup {
    async fn find_files(&self, query: &LookupQuery) -> Result<Vec<FileRecord>, LookupError> {
        Ok(self
            .scoped(query)
            .map(|w| {
                w.files
                    .iter()
                    .filter(|f| matches_any(query, &[f.name.as_str()]))
                    .take(query.limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_contents(&self, query: &LookupQuery) -> Result<Vec<ContentRecord>, LookupError> {
        Ok(self
            .scoped(query)
            .map(|w| {
                w.contents
                    .iter()
                    .filter(|c| matches_any(query, &[c.slug.as_str(), c.title.as_str()]))
                    .take(query.limit)
                    .map(|c| c.record())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn content_sections(
        &self,
        organization_id: &str,
        content_id: &str,
    ) -> Result<Vec<SectionRecord>, LookupError> {
        Ok(self
            .workspace(organization_id)
            .and_then(|w| w.content(content_id))
            .map(|c| c.sections.iter().map(|s| s.record()).collect())
            .unwrap_or_default())
    }

    async fn find_sources(&self, query: &LookupQuery) -> Result<Vec<SourceRecord>, LookupError> {
        Ok(self
            .scoped(query)
            .map(|w| {
                w.sources
                    .iter()
                    .filter(|s| matches_any(query, &[s.external_id.as_str(), s.title.as_str()]))
                    .take(query.limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
