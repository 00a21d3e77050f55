//! Resolve References use case
//!
//! Turns the `@mentions` of one user message into concrete workspace
//! entities. Lookup order per token:
//!
//! | Identifier | First | Fallback |
//! |------------|-------|----------|
//! | `source:x` / `source/x` | sources | none |
//! | contains `.` | files | contents |
//! | otherwise | contents | files |
//!
//! A content match with an anchor (`#intro`, `:key-takeaways`) is narrowed to
//! one of its sections. Ties in the best match tier are reported as
//! ambiguous, never picked arbitrarily.

use crate::ports::reference_lookup::{LookupError, ReferenceLookupPort};
use scribe_domain::reference::entities::MAX_AMBIGUOUS_CANDIDATES;
use scribe_domain::reference::matching::{classify, score};
use scribe_domain::{
    AmbiguousReference, AnchorKind, BestMatch, ContentRecord, FileRecord, LookupQuery,
    ReferenceCandidate, ReferenceKind, ReferenceToken, ResolutionOutcome, ResolvedReference,
    SectionRecord, SourceRecord, UnresolvedReason, UnresolvedReference, normalize_key,
    parse_references, select_best_match,
};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

const SOURCE_PREFIXES: [&str; 2] = ["source:", "source/"];

/// Errors that abort resolution of a whole message.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Reference lookup failed: {0}")]
    Lookup(#[source] LookupError),
}

/// Per-token result before it is folded into the outcome.
enum TokenResolution {
    Resolved(ResolvedReference),
    /// Content resolved but its anchor did not match a section.
    Degraded(ResolvedReference, UnresolvedReference),
    Ambiguous(AmbiguousReference),
    Unresolved(UnresolvedReference),
}

/// What a kind lookup produced.
enum KindMatch {
    None,
    Resolved(TokenResolution),
}

/// Use case for resolving `@mentions` against one organization's workspace.
pub struct ResolveReferencesUseCase<L: ReferenceLookupPort + ?Sized> {
    lookup: Arc<L>,
}

impl<L: ReferenceLookupPort + ?Sized> Clone for ResolveReferencesUseCase<L> {
    fn clone(&self) -> Self {
        Self {
            lookup: self.lookup.clone(),
        }
    }
}

impl<L: ReferenceLookupPort + ?Sized> ResolveReferencesUseCase<L> {
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// Parse `message` and resolve every mention in it.
    pub async fn resolve_message(
        &self,
        message: &str,
        organization_id: &str,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let tokens = parse_references(message);
        self.execute(&tokens, organization_id).await
    }

    /// Resolve `tokens` in order. The outcome lists preserve token order.
    pub async fn execute(
        &self,
        tokens: &[ReferenceToken],
        organization_id: &str,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let mut outcome = ResolutionOutcome::default();

        for token in tokens {
            match self.resolve_token(token, organization_id).await? {
                TokenResolution::Resolved(resolved) => outcome.resolved.push(resolved),
                TokenResolution::Degraded(resolved, unresolved) => {
                    outcome.resolved.push(resolved);
                    outcome.unresolved.push(unresolved);
                }
                TokenResolution::Ambiguous(ambiguous) => outcome.ambiguous.push(ambiguous),
                TokenResolution::Unresolved(unresolved) => outcome.unresolved.push(unresolved),
            }
        }

        debug!(
            "Resolved {} mention(s): {} resolved, {} ambiguous, {} unresolved",
            tokens.len(),
            outcome.resolved.len(),
            outcome.ambiguous.len(),
            outcome.unresolved.len()
        );
        Ok(outcome)
    }

    async fn resolve_token(
        &self,
        token: &ReferenceToken,
        organization_id: &str,
    ) -> Result<TokenResolution, ResolveError> {
        let identifier = token.identifier.trim();
        if identifier.is_empty() {
            return Ok(invalid(token));
        }

        let result = if token.is_source() {
            let needle = strip_source_prefix(identifier).trim();
            if needle.is_empty() {
                return Ok(invalid(token));
            }
            self.match_source(token, needle, organization_id).await
        } else {
            self.match_content_or_file(token, identifier, organization_id)
                .await
        };

        match result {
            Ok(KindMatch::Resolved(resolution)) => Ok(resolution),
            Ok(KindMatch::None) => Ok(TokenResolution::Unresolved(UnresolvedReference::new(
                token.clone(),
                UnresolvedReason::NotFound,
            ))),
            Err(LookupError::PermissionDenied(reason)) => {
                warn!("Permission denied resolving {}: {}", token.raw, reason);
                Ok(TokenResolution::Unresolved(UnresolvedReference::new(
                    token.clone(),
                    UnresolvedReason::Permission,
                )))
            }
            Err(e) => Err(ResolveError::Lookup(e)),
        }
    }

    async fn match_content_or_file(
        &self,
        token: &ReferenceToken,
        identifier: &str,
        organization_id: &str,
    ) -> Result<KindMatch, LookupError> {
        let query = LookupQuery::new(organization_id, identifier);
        let file_first = identifier.contains('.');

        let first = if file_first {
            self.match_file(token, &query).await?
        } else {
            self.match_content(token, &query).await?
        };
        if let KindMatch::Resolved(_) = first {
            return Ok(first);
        }

        if file_first {
            self.match_content(token, &query).await
        } else {
            self.match_file(token, &query).await
        }
    }

    async fn match_file(
        &self,
        token: &ReferenceToken,
        query: &LookupQuery,
    ) -> Result<KindMatch, LookupError> {
        let files = self.lookup.find_files(query).await?;
        let best = select_best_match(
            files,
            &query.needle,
            |f: &FileRecord| vec![f.name.clone()],
            |f: &FileRecord| format!("{}\u{0}{}", f.name, f.id),
        );

        Ok(match best {
            BestMatch::None => KindMatch::None,
            BestMatch::Single { item, .. } => {
                KindMatch::Resolved(TokenResolution::Resolved(ResolvedReference::File {
                    id: item.id,
                    token: token.clone(),
                    name: item.name,
                }))
            }
            BestMatch::Ambiguous { items, .. } => {
                let candidates = items
                    .iter()
                    .map(|f| file_candidate(f, &query.needle))
                    .collect();
                KindMatch::Resolved(ambiguous(token, candidates))
            }
        })
    }

    async fn match_content(
        &self,
        token: &ReferenceToken,
        query: &LookupQuery,
    ) -> Result<KindMatch, LookupError> {
        let contents = self.lookup.find_contents(query).await?;
        let best = select_best_match(
            contents,
            &query.needle,
            |c: &ContentRecord| vec![c.slug.clone(), c.title.clone()],
            |c: &ContentRecord| format!("{}\u{0}{}", c.title, c.id),
        );

        match best {
            BestMatch::None => Ok(KindMatch::None),
            BestMatch::Single { item, .. } => {
                let resolution = self
                    .narrow_to_section(token, item, &query.organization_id)
                    .await?;
                Ok(KindMatch::Resolved(resolution))
            }
            BestMatch::Ambiguous { items, .. } => {
                let candidates = items
                    .iter()
                    .map(|c| content_candidate(c, &query.needle))
                    .collect();
                Ok(KindMatch::Resolved(ambiguous(token, candidates)))
            }
        }
    }

    async fn match_source(
        &self,
        token: &ReferenceToken,
        needle: &str,
        organization_id: &str,
    ) -> Result<KindMatch, LookupError> {
        let query = LookupQuery::new(organization_id, needle);
        let sources = self.lookup.find_sources(&query).await?;
        let best = select_best_match(
            sources,
            needle,
            |s: &SourceRecord| vec![s.external_id.clone(), s.title.clone()],
            |s: &SourceRecord| format!("{}\u{0}{}", s.title, s.id),
        );

        Ok(match best {
            BestMatch::None => KindMatch::None,
            BestMatch::Single { item, .. } => {
                KindMatch::Resolved(TokenResolution::Resolved(ResolvedReference::Source {
                    id: item.id,
                    token: token.clone(),
                    external_id: item.external_id,
                    title: item.title,
                    status: item.status,
                }))
            }
            BestMatch::Ambiguous { items, .. } => {
                let candidates = items
                    .iter()
                    .map(|s| source_candidate(s, needle))
                    .collect();
                KindMatch::Resolved(ambiguous(token, candidates))
            }
        })
    }

    /// Apply the token's anchor, if any, to a resolved content item.
    async fn narrow_to_section(
        &self,
        token: &ReferenceToken,
        content: ContentRecord,
        organization_id: &str,
    ) -> Result<TokenResolution, LookupError> {
        let Some(anchor) = token.anchor.as_ref().filter(|a| !a.value.trim().is_empty()) else {
            return Ok(TokenResolution::Resolved(content_reference(token, content)));
        };

        let sections = self
            .lookup
            .content_sections(organization_id, &content.id)
            .await?;
        let value = anchor.value.trim();

        let found = match anchor.kind {
            AnchorKind::Hash => find_section_by_id(&sections, value)
                .or_else(|| find_section_by_label(&sections, value)),
            AnchorKind::Colon => find_section_by_label(&sections, value)
                .or_else(|| find_section_by_id(&sections, value)),
        };

        match found {
            Some(section) => Ok(TokenResolution::Resolved(ResolvedReference::Section {
                id: section.id.clone(),
                token: token.clone(),
                title: section.title.clone(),
                section_type: section.section_type.clone(),
                content_id: content.id,
                content_slug: content.slug,
            })),
            None => {
                debug!(
                    "No section matches '{}' in content {}; keeping the content",
                    value, content.id
                );
                let suggestions = sections
                    .iter()
                    .map(|s| section_candidate(s, &content))
                    .collect();
                let unresolved =
                    UnresolvedReference::new(token.clone(), UnresolvedReason::SectionNotFound)
                        .with_suggestions(suggestions);
                Ok(TokenResolution::Degraded(
                    content_reference(token, content),
                    unresolved,
                ))
            }
        }
    }
}

fn strip_source_prefix(identifier: &str) -> &str {
    SOURCE_PREFIXES
        .iter()
        .find_map(|p| identifier.strip_prefix(p))
        .unwrap_or(identifier)
}

fn invalid(token: &ReferenceToken) -> TokenResolution {
    TokenResolution::Unresolved(UnresolvedReference::new(
        token.clone(),
        UnresolvedReason::Invalid,
    ))
}

fn content_reference(token: &ReferenceToken, content: ContentRecord) -> ResolvedReference {
    ResolvedReference::Content {
        id: content.id,
        token: token.clone(),
        slug: content.slug,
        title: content.title,
        status: content.status,
    }
}

fn find_section_by_id<'a>(sections: &'a [SectionRecord], value: &str) -> Option<&'a SectionRecord> {
    sections.iter().find(|s| s.id == value)
}

/// First section (in document order) whose title or type normalizes to `value`.
fn find_section_by_label<'a>(
    sections: &'a [SectionRecord],
    value: &str,
) -> Option<&'a SectionRecord> {
    let wanted = normalize_key(value);
    if wanted.is_empty() {
        return None;
    }
    sections.iter().find(|s| {
        normalize_key(&s.title) == wanted
            || s.section_type
                .as_deref()
                .is_some_and(|t| normalize_key(t) == wanted)
    })
}

/// Highest score any of `keys` earns against `needle`.
fn best_score(needle: &str, keys: &[&str]) -> f64 {
    let needle = normalize_key(needle);
    keys.iter()
        .filter_map(|k| classify(&needle, k).map(|tier| score(tier, &needle, k)))
        .fold(0.0, f64::max)
}

fn file_candidate(file: &FileRecord, needle: &str) -> ReferenceCandidate {
    ReferenceCandidate {
        kind: ReferenceKind::File,
        id: file.id.clone(),
        label: file.name.clone(),
        subtitle: file.mime_type.clone(),
        reference: format!("@{}", file.name),
        score: best_score(needle, &[&file.name]),
    }
}

fn content_candidate(content: &ContentRecord, needle: &str) -> ReferenceCandidate {
    ReferenceCandidate {
        kind: ReferenceKind::Content,
        id: content.id.clone(),
        label: content.title.clone(),
        subtitle: Some(format!("{} · {}", content.slug, content.status)),
        reference: format!("@{}", content.slug),
        score: best_score(needle, &[&content.slug, &content.title]),
    }
}

fn source_candidate(source: &SourceRecord, needle: &str) -> ReferenceCandidate {
    ReferenceCandidate {
        kind: ReferenceKind::Source,
        id: source.id.clone(),
        label: source.title.clone(),
        subtitle: Some(source.external_id.clone()),
        reference: format!("@source:{}", source.external_id),
        score: best_score(needle, &[&source.external_id, &source.title]),
    }
}

fn section_candidate(section: &SectionRecord, content: &ContentRecord) -> ReferenceCandidate {
    ReferenceCandidate {
        kind: ReferenceKind::Section,
        id: section.id.clone(),
        label: section.title.clone(),
        subtitle: section.section_type.clone(),
        reference: format!("@{}#{}", content.slug, section.id),
        score: 0.0,
    }
}

/// Rank by score (desc), then label, then id; keep the top few.
fn ambiguous(token: &ReferenceToken, mut candidates: Vec<ReferenceCandidate>) -> TokenResolution {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(MAX_AMBIGUOUS_CANDIDATES);
    TokenResolution::Ambiguous(AmbiguousReference {
        token: token.clone(),
        candidates,
    })
}

/// Context block describing what the user's mentions resolved to.
///
/// Returns `None` when the message had no mentions at all.
pub fn describe_resolution(outcome: &ResolutionOutcome) -> Option<String> {
    if outcome.is_empty() {
        return None;
    }

    let mut sections = Vec::new();

    if !outcome.resolved.is_empty() {
        let lines: Vec<String> = outcome
            .resolved
            .iter()
            .map(|r| {
                format!(
                    "- {} {} (id: {}) via {}",
                    r.kind().as_str(),
                    r.label(),
                    r.id(),
                    r.token().raw
                )
            })
            .collect();
        sections.push(format!(
            "Referenced in this message (only these may be modified):\n{}",
            lines.join("\n")
        ));
    }

    if !outcome.ambiguous.is_empty() {
        let lines: Vec<String> = outcome
            .ambiguous
            .iter()
            .map(|a| {
                let options: Vec<String> = a
                    .candidates
                    .iter()
                    .map(|c| format!("{} ({})", c.label, c.reference))
                    .collect();
                format!("- {} could mean: {}", a.token.raw, options.join(", "))
            })
            .collect();
        sections.push(format!(
            "Ambiguous mentions (ask the user which one they meant):\n{}",
            lines.join("\n")
        ));
    }

    if !outcome.unresolved.is_empty() {
        let lines: Vec<String> = outcome
            .unresolved
            .iter()
            .map(|u| format!("- {} ({})", u.token.raw, u.reason.as_str()))
            .collect();
        sections.push(format!("Unresolved mentions:\n{}", lines.join("\n")));
    }

    Some(sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scribe_domain::build_scope;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Substring lookup over fixed records, recording every needle it sees.
    #[derive(Default)]
    struct FixtureLookup {
        files: Vec<FileRecord>,
        contents: Vec<ContentRecord>,
        sections: HashMap<String, Vec<SectionRecord>>,
        sources: Vec<SourceRecord>,
        deny_sources: bool,
        fail_files: bool,
        queries: Mutex<Vec<String>>,
    }

    fn contains(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    #[async_trait]
    impl ReferenceLookupPort for FixtureLookup {
        async fn find_files(&self, query: &LookupQuery) -> Result<Vec<FileRecord>, LookupError> {
            self.queries.lock().unwrap().push(format!("file:{}", query.needle));
            if self.fail_files {
                return Err(LookupError::Backend("connection reset".to_string()));
            }
            Ok(self
                .files
                .iter()
                .filter(|f| contains(&f.name, &query.needle))
                .cloned()
                .collect())
        }

        async fn find_contents(
            &self,
            query: &LookupQuery,
        ) -> Result<Vec<ContentRecord>, LookupError> {
            self.queries.lock().unwrap().push(format!("content:{}", query.needle));
            Ok(self
                .contents
                .iter()
                .filter(|c| contains(&c.slug, &query.needle) || contains(&c.title, &query.needle))
                .cloned()
                .collect())
        }

        async fn content_sections(
            &self,
            _organization_id: &str,
            content_id: &str,
        ) -> Result<Vec<SectionRecord>, LookupError> {
            Ok(self.sections.get(content_id).cloned().unwrap_or_default())
        }

        async fn find_sources(
            &self,
            query: &LookupQuery,
        ) -> Result<Vec<SourceRecord>, LookupError> {
            self.queries.lock().unwrap().push(format!("source:{}", query.needle));
            if self.deny_sources {
                return Err(LookupError::PermissionDenied("sources".to_string()));
            }
            Ok(self
                .sources
                .iter()
                .filter(|s| {
                    contains(&s.external_id, &query.needle) || contains(&s.title, &query.needle)
                })
                .cloned()
                .collect())
        }
    }

    fn content(id: &str, slug: &str, title: &str) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            status: "draft".to_string(),
        }
    }

    fn section(id: &str, title: &str, section_type: Option<&str>) -> SectionRecord {
        SectionRecord {
            id: id.to_string(),
            title: title.to_string(),
            section_type: section_type.map(str::to_string),
        }
    }

    fn file(id: &str, name: &str) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: None,
        }
    }

    fn fixture() -> FixtureLookup {
        let mut sections = HashMap::new();
        sections.insert(
            "c-launch".to_string(),
            vec![
                section("s-intro", "Introduction", Some("intro")),
                section("s-takeaways", "Key Takeaways", Some("summary")),
            ],
        );
        FixtureLookup {
            files: vec![file("f1", "report-final.pdf"), file("f2", "report-draft.pdf")],
            contents: vec![
                content("c-launch", "launch-post", "Launch Post"),
                content("c-roadmap", "roadmap", "Roadmap 2026"),
                content("c-roadmap-q1", "roadmap-q1", "Roadmap Q1"),
            ],
            sections,
            sources: vec![SourceRecord {
                id: "src-1".to_string(),
                external_id: "yt-42".to_string(),
                title: "Keynote".to_string(),
                status: "ready".to_string(),
            }],
            ..Default::default()
        }
    }

    fn use_case(lookup: FixtureLookup) -> ResolveReferencesUseCase<FixtureLookup> {
        ResolveReferencesUseCase::new(Arc::new(lookup))
    }

    #[tokio::test]
    async fn test_exact_content_match() {
        let outcome = use_case(fixture())
            .resolve_message("Tighten @launch-post please", "org")
            .await
            .unwrap();
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved[0].id(), "c-launch");
        assert_eq!(outcome.resolved[0].kind(), ReferenceKind::Content);
    }

    #[tokio::test]
    async fn test_exact_beats_prefix() {
        // "roadmap" is exact for c-roadmap and only a prefix of roadmap-q1
        let outcome = use_case(fixture())
            .resolve_message("@roadmap", "org")
            .await
            .unwrap();
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved[0].id(), "c-roadmap");
    }

    #[tokio::test]
    async fn test_ambiguous_files_report_both_candidates() {
        let outcome = use_case(fixture())
            .resolve_message("Attach @report", "org")
            .await
            .unwrap();
        assert!(outcome.resolved.is_empty());
        assert_eq!(outcome.ambiguous.len(), 1);

        let candidates = &outcome.ambiguous[0].candidates;
        let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"f1") && ids.contains(&"f2"));
        assert!(candidates.iter().all(|c| c.reference.starts_with("@report-")));
        assert!(build_scope(&outcome.resolved).is_empty());
    }

    #[tokio::test]
    async fn test_shared_prefix_files_are_ambiguous_until_exact() {
        let lookup = FixtureLookup {
            files: vec![file("f1", "report.pdf"), file("f2", "report-final.pdf")],
            ..Default::default()
        };
        let outcome = use_case(lookup).resolve_message("see @report", "org").await.unwrap();
        assert!(outcome.resolved.is_empty());
        assert_eq!(outcome.ambiguous[0].candidates.len(), 2);

        let lookup = FixtureLookup {
            files: vec![file("f0", "report"), file("f2", "report-final.pdf")],
            ..Default::default()
        };
        let outcome = use_case(lookup).resolve_message("see @report", "org").await.unwrap();
        assert!(outcome.ambiguous.is_empty());
        assert_eq!(outcome.resolved[0].id(), "f0");
    }

    #[tokio::test]
    async fn test_hash_anchor_matches_section_title() {
        let mut sections = HashMap::new();
        sections.insert(
            "c-acme".to_string(),
            vec![section("sec_0", "Intro", None), section("sec_1", "Pricing", None)],
        );
        let lookup = FixtureLookup {
            contents: vec![content("c-acme", "acme-launch", "Acme Launch")],
            sections,
            ..Default::default()
        };
        let outcome = use_case(lookup)
            .resolve_message("Summarize @acme-launch#intro please", "org")
            .await
            .unwrap();
        assert!(outcome.ambiguous.is_empty());
        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved[0].kind(), ReferenceKind::Section);
        assert_eq!(outcome.resolved[0].id(), "sec_0");
    }

    #[tokio::test]
    async fn test_dotted_identifier_queries_files_first() {
        let lookup = fixture();
        let uc = use_case(lookup);
        uc.resolve_message("@report-final.pdf", "org").await.unwrap();
        let queries = uc.lookup.queries.lock().unwrap().clone();
        assert_eq!(queries, vec!["file:report-final.pdf"]);
    }

    #[tokio::test]
    async fn test_content_miss_falls_back_to_file() {
        let mut lookup = fixture();
        lookup.files.push(file("f3", "hero-image"));
        let uc = use_case(lookup);
        let outcome = uc.resolve_message("@hero-image", "org").await.unwrap();
        assert_eq!(outcome.resolved[0].kind(), ReferenceKind::File);
        let queries = uc.lookup.queries.lock().unwrap().clone();
        assert_eq!(queries, vec!["content:hero-image", "file:hero-image"]);
    }

    #[tokio::test]
    async fn test_colon_anchor_upgrades_to_section() {
        let outcome = use_case(fixture())
            .resolve_message("Shorten @launch-post:key-takeaways", "org")
            .await
            .unwrap();
        assert_eq!(outcome.resolved.len(), 1);
        match &outcome.resolved[0] {
            ResolvedReference::Section {
                id,
                content_id,
                content_slug,
                ..
            } => {
                assert_eq!(id, "s-takeaways");
                assert_eq!(content_id, "c-launch");
                assert_eq!(content_slug, "launch-post");
            }
            other => panic!("unexpected {:?}", other),
        }
        let scope = build_scope(&outcome.resolved);
        assert!(scope.allows_section("s-takeaways"));
        assert!(!scope.allows_content("c-launch"));
    }

    #[tokio::test]
    async fn test_hash_anchor_matches_id_then_type() {
        let by_id = use_case(fixture())
            .resolve_message("@launch-post#s-intro", "org")
            .await
            .unwrap();
        assert_eq!(by_id.resolved[0].id(), "s-intro");

        let by_type = use_case(fixture())
            .resolve_message("@launch-post#summary", "org")
            .await
            .unwrap();
        assert_eq!(by_type.resolved[0].id(), "s-takeaways");
    }

    #[tokio::test]
    async fn test_missing_section_degrades_to_content() {
        let outcome = use_case(fixture())
            .resolve_message("@launch-post#conclusion", "org")
            .await
            .unwrap();
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved[0].kind(), ReferenceKind::Content);
        assert_eq!(outcome.unresolved.len(), 1);
        assert_eq!(outcome.unresolved[0].reason, UnresolvedReason::SectionNotFound);
        assert_eq!(outcome.unresolved[0].suggestions.len(), 2);
        assert_eq!(outcome.unresolved[0].suggestions[0].reference, "@launch-post#s-intro");
    }

    #[tokio::test]
    async fn test_source_prefix_is_stripped() {
        let uc = use_case(fixture());
        let outcome = uc.resolve_message("Draft from @source:yt-42", "org").await.unwrap();
        assert_eq!(outcome.resolved[0].kind(), ReferenceKind::Source);
        assert_eq!(outcome.resolved[0].id(), "src-1");
        assert!(build_scope(&outcome.resolved).is_empty());
        assert_eq!(uc.lookup.queries.lock().unwrap().clone(), vec!["source:yt-42"]);
    }

    #[tokio::test]
    async fn test_not_found() {
        let outcome = use_case(fixture())
            .resolve_message("@nothing-here", "org")
            .await
            .unwrap();
        assert_eq!(outcome.unresolved[0].reason, UnresolvedReason::NotFound);
        assert!(outcome.unresolved[0].suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_empty_identifier_is_invalid_without_query() {
        let uc = use_case(fixture());
        let token = ReferenceToken {
            raw: "@source:".to_string(),
            identifier: "source:".to_string(),
            anchor: None,
            start: 0,
            end: 8,
        };
        let outcome = uc.execute(&[token], "org").await.unwrap();
        assert_eq!(outcome.unresolved[0].reason, UnresolvedReason::Invalid);
        assert!(uc.lookup.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied_is_unresolved() {
        let mut lookup = fixture();
        lookup.deny_sources = true;
        let outcome = use_case(lookup)
            .resolve_message("@source:yt-42 and @launch-post", "org")
            .await
            .unwrap();
        assert_eq!(outcome.unresolved[0].reason, UnresolvedReason::Permission);
        assert_eq!(outcome.resolved.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_aborts() {
        let mut lookup = fixture();
        lookup.fail_files = true;
        let err = use_case(lookup)
            .resolve_message("@report.pdf", "org")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(LookupError::Backend(_))));
    }

    #[tokio::test]
    async fn test_describe_resolution() {
        let outcome = use_case(fixture())
            .resolve_message("@launch-post @report @ghost", "org")
            .await
            .unwrap();
        let text = describe_resolution(&outcome).unwrap();
        assert!(text.contains("c-launch"));
        assert!(text.contains("@report could mean"));
        assert!(text.contains("@ghost (not_found)"));

        assert!(describe_resolution(&ResolutionOutcome::default()).is_none());
    }
}
