//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What a tool is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Read-only lookups; available in every mode.
    Read,
    /// Mutates content, sections or metadata.
    Write,
    /// Pulls an external source into the workspace.
    Ingest,
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Read => "read",
            ToolKind::Write => "write",
            ToolKind::Ingest => "ingest",
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, ToolKind::Read)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timeout budget class of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutClass {
    /// Long-running drafting from a source (300 s by default).
    Generation,
    /// Source ingestion: download + transcription (180 s by default).
    Ingestion,
    /// Everything else (120 s by default).
    Standard,
}

impl TimeoutClass {
    pub fn default_duration(&self) -> Duration {
        match self {
            TimeoutClass::Generation => Duration::from_secs(300),
            TimeoutClass::Ingestion => Duration::from_secs(180),
            TimeoutClass::Standard => Duration::from_secs(120),
        }
    }
}

/// Closed set of tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ReadContent,
    ListSections,
    SearchSources,
    ContentWrite,
    EditSection,
    EditMetadata,
    InsertImage,
    GenerateContent,
    IngestSource,
}

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::ReadContent,
        ToolName::ListSections,
        ToolName::SearchSources,
        ToolName::ContentWrite,
        ToolName::EditSection,
        ToolName::EditMetadata,
        ToolName::InsertImage,
        ToolName::GenerateContent,
        ToolName::IngestSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadContent => "read_content",
            ToolName::ListSections => "list_sections",
            ToolName::SearchSources => "search_sources",
            ToolName::ContentWrite => "content_write",
            ToolName::EditSection => "edit_section",
            ToolName::EditMetadata => "edit_metadata",
            ToolName::InsertImage => "insert_image",
            ToolName::GenerateContent => "generate_content",
            ToolName::IngestSource => "ingest_source",
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolName::ReadContent | ToolName::ListSections | ToolName::SearchSources => {
                ToolKind::Read
            }
            ToolName::ContentWrite
            | ToolName::EditSection
            | ToolName::EditMetadata
            | ToolName::InsertImage
            | ToolName::GenerateContent => ToolKind::Write,
            ToolName::IngestSource => ToolKind::Ingest,
        }
    }

    pub fn timeout_class(&self) -> TimeoutClass {
        match self {
            ToolName::GenerateContent => TimeoutClass::Generation,
            ToolName::IngestSource => TimeoutClass::Ingestion,
            _ => TimeoutClass::Standard,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a model names a tool outside the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool: {0}")]
pub struct UnknownToolError(pub String);

impl FromStr for ToolName {
    type Err = UnknownToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownToolError(s.to_string()))
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// JSON Schema type hint ("string", "integer", "array", ...)
    pub param_type: String,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }
}

/// Definition of a tool as offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: ToolName,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    pub fn new(name: ToolName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Catalogue of the tools a turn may offer and dispatch.
///
/// Kind and timeout class come from [`ToolName`]; the registry only decides
/// which tools exist and how they are described to the model.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register(mut self, definition: ToolDefinition) -> Self {
        self.tools.insert(definition.name, definition);
        self
    }

    /// The full content-workspace catalogue.
    pub fn standard() -> Self {
        let content_id = || ToolParameter::new("contentId", "ID of the content item", true);
        let instructions =
            |required| ToolParameter::new("instructions", "What to change and how", required);

        Self::new()
            .register(
                ToolDefinition::new(ToolName::ReadContent, "Read a content item and its sections")
                    .with_parameter(content_id()),
            )
            .register(
                ToolDefinition::new(
                    ToolName::ListSections,
                    "List the sections of a content item in order",
                )
                .with_parameter(content_id()),
            )
            .register(
                ToolDefinition::new(
                    ToolName::SearchSources,
                    "Search ingested sources by title or external id",
                )
                .with_parameter(ToolParameter::new("query", "Search text", true))
                .with_parameter(
                    ToolParameter::new("limit", "Maximum number of results", false)
                        .with_type("integer"),
                ),
            )
            .register(
                ToolDefinition::new(
                    ToolName::ContentWrite,
                    "Rewrite the body of an existing content item",
                )
                .with_parameter(content_id())
                .with_parameter(instructions(true)),
            )
            .register(
                ToolDefinition::new(ToolName::EditSection, "Rewrite a single section")
                    .with_parameter(ToolParameter::new("sectionId", "ID of the section", true))
                    .with_parameter(instructions(true)),
            )
            .register(
                ToolDefinition::new(
                    ToolName::EditMetadata,
                    "Update title, description or tags of a content item",
                )
                .with_parameter(content_id())
                .with_parameter(ToolParameter::new("title", "New title", false))
                .with_parameter(ToolParameter::new("description", "New description", false))
                .with_parameter(ToolParameter::new("tags", "Replacement tags", false).with_type("array")),
            )
            .register(
                ToolDefinition::new(ToolName::InsertImage, "Insert an uploaded image into content")
                    .with_parameter(content_id())
                    .with_parameter(ToolParameter::new("fileId", "ID of the uploaded file", true))
                    .with_parameter(ToolParameter::new(
                        "sectionId",
                        "Section to insert after",
                        false,
                    ))
                    .with_parameter(ToolParameter::new("altText", "Image alt text", false)),
            )
            .register(
                ToolDefinition::new(
                    ToolName::GenerateContent,
                    "Draft a new content item from an ingested source",
                )
                .with_parameter(ToolParameter::new("sourceId", "ID of the source", true))
                .with_parameter(ToolParameter::new(
                    "format",
                    "Output format (blog_post, newsletter, thread, ...)",
                    true,
                ))
                .with_parameter(instructions(false)),
            )
            .register(
                ToolDefinition::new(
                    ToolName::IngestSource,
                    "Ingest a video, podcast or document by URL",
                )
                .with_parameter(ToolParameter::new("url", "Source URL", true))
                .with_parameter(ToolParameter::new("title", "Optional title", false)),
            )
    }

    pub fn get(&self, name: ToolName) -> Option<&ToolDefinition> {
        self.tools.get(&name)
    }

    pub fn contains(&self, name: ToolName) -> bool {
        self.tools.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = ToolName> + '_ {
        self.tools.keys().copied()
    }

    /// Definitions whose kind is in `kinds`, in catalogue order.
    pub fn tools_by_kind(&self, kinds: &[ToolKind]) -> Vec<&ToolDefinition> {
        self.tools
            .values()
            .filter(|d| kinds.contains(&d.name.kind()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip_through_str() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
        assert_eq!(
            "delete_everything".parse::<ToolName>(),
            Err(UnknownToolError("delete_everything".to_string()))
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ToolName::ReadContent.kind(), ToolKind::Read);
        assert_eq!(ToolName::EditSection.kind(), ToolKind::Write);
        assert_eq!(ToolName::IngestSource.kind(), ToolKind::Ingest);
        assert!(!ToolKind::Read.is_mutating());
        assert!(ToolKind::Ingest.is_mutating());
    }

    #[test]
    fn test_timeout_classes() {
        assert_eq!(ToolName::GenerateContent.timeout_class(), TimeoutClass::Generation);
        assert_eq!(ToolName::IngestSource.timeout_class(), TimeoutClass::Ingestion);
        assert_eq!(ToolName::EditMetadata.timeout_class(), TimeoutClass::Standard);
        assert_eq!(TimeoutClass::Generation.default_duration(), Duration::from_secs(300));
        assert_eq!(TimeoutClass::Ingestion.default_duration(), Duration::from_secs(180));
        assert_eq!(TimeoutClass::Standard.default_duration(), Duration::from_secs(120));
    }

    #[test]
    fn test_standard_registry_covers_every_tool() {
        let registry = ToolRegistry::standard();
        assert_eq!(registry.names().count(), ToolName::ALL.len());
        for name in ToolName::ALL {
            assert!(registry.contains(name));
            assert_eq!(registry.get(name).unwrap().name, name);
        }
    }

    #[test]
    fn test_partial_registry() {
        let registry = ToolRegistry::new()
            .register(ToolDefinition::new(ToolName::ReadContent, "Read"));
        assert!(registry.contains(ToolName::ReadContent));
        assert!(!registry.contains(ToolName::EditMetadata));
        assert!(registry.get(ToolName::EditMetadata).is_none());
        assert!(
            registry
                .tools_by_kind(&[ToolKind::Write, ToolKind::Ingest])
                .is_empty()
        );
    }

    #[test]
    fn test_tools_by_kind() {
        let registry = ToolRegistry::standard();
        let read = registry.tools_by_kind(&[ToolKind::Read]);
        assert_eq!(read.len(), 3);
        assert!(read.iter().all(|d| d.name.kind() == ToolKind::Read));

        let all = registry.tools_by_kind(&[ToolKind::Read, ToolKind::Write, ToolKind::Ingest]);
        assert_eq!(all.len(), 9);
    }
}
