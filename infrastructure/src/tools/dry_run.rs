//! Dry-run tool executor.
//!
//! [`DryRunToolExecutor`] answers read tools from a [`WorkspaceFixture`] and
//! reports what mutating tools *would* do without changing anything. It is
//! the executor behind `scribe chat`, which lets a provider be exercised end
//! to end against a local workspace snapshot.
//!
//! | Tool | Behaviour |
//! |------|-----------|
//! | `read_content`, `list_sections` | fixture data, failure when the id is unknown |
//! | `search_sources` | LIKE match over external id and title |
//! | writes | entity existence check, then a description of the change |
//! | `generate_content` | draft id `draft-<sourceId>` as both correlation ids |
//! | `ingest_source` | queued source id, progress lines |

use crate::reference::{FixtureContent, WorkspaceFixture};
use async_trait::async_trait;
use scribe_application::ports::tool_executor::{ToolExecutorPort, ToolProgress};
use scribe_domain::tool::invocation::{
    ContentRefArgs, ContentWriteArgs, EditMetadataArgs, EditSectionArgs, GenerateContentArgs,
    IngestSourceArgs, InsertImageArgs, SearchSourcesArgs,
};
use scribe_domain::{ChatToolInvocation, LookupQuery, ToolExecutionResult};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Executor that never mutates anything.
pub struct DryRunToolExecutor {
    workspace: Arc<WorkspaceFixture>,
    executed: Mutex<Vec<(String, ChatToolInvocation)>>,
    ingested: AtomicUsize,
}

impl DryRunToolExecutor {
    pub fn new(workspace: Arc<WorkspaceFixture>) -> Self {
        Self {
            workspace,
            executed: Mutex::new(Vec::new()),
            ingested: AtomicUsize::new(0),
        }
    }

    /// Every call received so far, as `(tool_call_id, invocation)`.
    pub fn executed(&self) -> Vec<(String, ChatToolInvocation)> {
        self.executed
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn content(&self, id: &str) -> Result<&FixtureContent, ToolExecutionResult> {
        self.workspace
            .content(id)
            .ok_or_else(|| ToolExecutionResult::failure(format!("Content {} was not found.", id)))
    }

    fn read_content(&self, args: &ContentRefArgs) -> ToolExecutionResult {
        match self.content(&args.content_id) {
            Ok(content) => ToolExecutionResult::success(json!({
                "id": content.id,
                "slug": content.slug,
                "title": content.title,
                "status": content.status,
                "description": content.description,
                "tags": content.tags,
                "sections": content.sections.iter().map(|s| json!({
                    "id": s.id,
                    "title": s.title,
                    "sectionType": s.section_type,
                    "body": s.body,
                })).collect::<Vec<_>>(),
            }))
            .with_content_id(&content.id),
            Err(failure) => failure,
        }
    }

    fn list_sections(&self, args: &ContentRefArgs) -> ToolExecutionResult {
        match self.content(&args.content_id) {
            Ok(content) => ToolExecutionResult::success(json!({
                "contentId": content.id,
                "sections": content.sections.iter().enumerate().map(|(position, s)| json!({
                    "position": position,
                    "id": s.id,
                    "title": s.title,
                    "sectionType": s.section_type,
                })).collect::<Vec<_>>(),
            }))
            .with_content_id(&content.id),
            Err(failure) => failure,
        }
    }

    fn search_sources(&self, args: &SearchSourcesArgs) -> ToolExecutionResult {
        let limit = args
            .limit
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_SEARCH_LIMIT);
        let query = LookupQuery::new(&self.workspace.organization_id, &args.query);
        let matches: Vec<Value> = self
            .workspace
            .sources
            .iter()
            .filter(|s| query.matches(&s.external_id) || query.matches(&s.title))
            .take(limit)
            .map(|s| json!({"id": s.id, "externalId": s.external_id, "title": s.title, "status": s.status}))
            .collect();
        ToolExecutionResult::success(json!({ "sources": matches }))
    }

    fn content_write(&self, args: &ContentWriteArgs) -> ToolExecutionResult {
        match self.content(&args.content_id) {
            Ok(content) => would(
                format!("rewrite the body of '{}'", content.title),
                json!({"instructions": args.instructions}),
            )
            .with_content_id(&content.id),
            Err(failure) => failure,
        }
    }

    fn edit_section(&self, args: &EditSectionArgs) -> ToolExecutionResult {
        match self.workspace.section(&args.section_id) {
            Some((content, section)) => would(
                format!("rewrite section '{}' of '{}'", section.title, content.title),
                json!({"sectionId": section.id, "instructions": args.instructions}),
            )
            .with_content_id(&content.id),
            None => ToolExecutionResult::failure(format!(
                "Section {} was not found.",
                args.section_id
            )),
        }
    }

    fn edit_metadata(&self, args: &EditMetadataArgs) -> ToolExecutionResult {
        if args.title.is_none() && args.description.is_none() && args.tags.is_none() {
            return ToolExecutionResult::failure(
                "Provide at least one of title, description or tags.",
            );
        }
        match self.content(&args.content_id) {
            Ok(content) => would(
                format!("update metadata of '{}'", content.title),
                json!({
                    "title": args.title,
                    "description": args.description,
                    "tags": args.tags,
                }),
            )
            .with_content_id(&content.id),
            Err(failure) => failure,
        }
    }

    fn insert_image(&self, args: &InsertImageArgs) -> ToolExecutionResult {
        let content = match self.content(&args.content_id) {
            Ok(content) => content,
            Err(failure) => return failure,
        };
        let Some(file) = self.workspace.file(&args.file_id) else {
            return ToolExecutionResult::failure(format!("File {} was not found.", args.file_id));
        };
        if let Some(section_id) = &args.section_id
            && !content.sections.iter().any(|s| &s.id == section_id)
        {
            return ToolExecutionResult::failure(format!(
                "Section {} is not part of '{}'.",
                section_id, content.title
            ));
        }
        would(
            format!("insert '{}' into '{}'", file.name, content.title),
            json!({"fileId": file.id, "sectionId": args.section_id, "altText": args.alt_text}),
        )
        .with_content_id(&content.id)
    }

    fn generate_content(
        &self,
        args: &GenerateContentArgs,
        progress: &ToolProgress,
    ) -> ToolExecutionResult {
        let Some(source) = self.workspace.source(&args.source_id) else {
            return ToolExecutionResult::failure(format!(
                "Source {} was not found.",
                args.source_id
            ));
        };
        if source.status != "ready" {
            return ToolExecutionResult::failure(format!(
                "Source '{}' is still {}; try again once it is ready.",
                source.title, source.status
            ));
        }
        progress.report(format!("Drafting {} from '{}'", args.format, source.title));
        let draft_id = format!("draft-{}", source.id);
        would(
            format!("draft a {} from '{}'", args.format, source.title),
            json!({"sourceId": source.id, "format": args.format, "draftId": draft_id}),
        )
        .with_content_id(&draft_id)
        .with_source_content_id(&draft_id)
    }

    fn ingest_source(&self, args: &IngestSourceArgs, progress: &ToolProgress) -> ToolExecutionResult {
        if !(args.url.starts_with("http://") || args.url.starts_with("https://")) {
            return ToolExecutionResult::failure(format!("'{}' is not an http(s) URL.", args.url));
        }
        progress.report(format!("Fetching {}", args.url));
        let n = self.ingested.fetch_add(1, Ordering::Relaxed) + 1;
        progress.report("Queued for transcription");
        ToolExecutionResult::success(json!({
            "dryRun": true,
            "sourceId": format!("src-dry-{}", n),
            "url": args.url,
            "title": args.title,
            "status": "queued",
        }))
    }
}

/// Success result describing a change that was not applied.
fn would(action: String, details: Value) -> ToolExecutionResult {
    ToolExecutionResult::success(json!({
        "dryRun": true,
        "summary": format!("Would {}.", action),
        "details": details,
    }))
}

#[async_trait]
impl ToolExecutorPort for DryRunToolExecutor {
    async fn execute(
        &self,
        invocation: ChatToolInvocation,
        tool_call_id: String,
        progress: ToolProgress,
    ) -> ToolExecutionResult {
        info!("[dry-run] {} ({})", invocation.name(), tool_call_id);
        if let Ok(mut executed) = self.executed.lock() {
            executed.push((tool_call_id, invocation.clone()));
        }

        match &invocation {
            ChatToolInvocation::ReadContent(args) => self.read_content(args),
            ChatToolInvocation::ListSections(args) => self.list_sections(args),
            ChatToolInvocation::SearchSources(args) => self.search_sources(args),
            ChatToolInvocation::ContentWrite(args) => self.content_write(args),
            ChatToolInvocation::EditSection(args) => self.edit_section(args),
            ChatToolInvocation::EditMetadata(args) => self.edit_metadata(args),
            ChatToolInvocation::InsertImage(args) => self.insert_image(args),
            ChatToolInvocation::GenerateContent(args) => self.generate_content(args, &progress),
            ChatToolInvocation::IngestSource(args) => self.ingest_source(args, &progress),
        }
    }
}
