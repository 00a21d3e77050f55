//! Reference lookup port.
//!
//! Backend queries the mention resolver issues. Every query is scoped to one
//! organization and matches by case-insensitive substring; tier ranking
//! happens afterwards in the domain layer.

use async_trait::async_trait;
use scribe_domain::{ContentRecord, FileRecord, LookupQuery, SectionRecord, SourceRecord};
use thiserror::Error;

/// Errors that can occur during a backend lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The caller may not see the requested entities.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The backend could not answer.
    #[error("Lookup backend error: {0}")]
    Backend(String),
}

/// Port for looking up mentionable entities.
///
/// Infrastructure adapters implement this over a database or an in-memory
/// fixture. Implementations return at most `query.limit` rows.
#[async_trait]
pub trait ReferenceLookupPort: Send + Sync {
    /// Files whose name contains the needle.
    async fn find_files(&self, query: &LookupQuery) -> Result<Vec<FileRecord>, LookupError>;

    /// Content items whose slug or title contains the needle.
    async fn find_contents(&self, query: &LookupQuery) -> Result<Vec<ContentRecord>, LookupError>;

    /// Current sections of one content item, in document order.
    async fn content_sections(
        &self,
        organization_id: &str,
        content_id: &str,
    ) -> Result<Vec<SectionRecord>, LookupError>;

    /// Sources whose external id or title contains the needle.
    async fn find_sources(&self, query: &LookupQuery) -> Result<Vec<SourceRecord>, LookupError>;
}
