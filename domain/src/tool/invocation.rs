//! Typed tool invocations parsed from model output.
//!
//! A model-issued call arrives as a `(name, arguments-json)` pair. Parsing
//! resolves the name against the closed [`ToolName`] set and deserializes the
//! arguments into the tool's argument record, rejecting missing required and
//! unknown fields.

use super::entities::{ToolName, UnknownToolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvocationParseError {
    #[error(transparent)]
    UnknownTool(#[from] UnknownToolError),

    #[error("invalid JSON arguments for {tool}: {source}")]
    InvalidJson {
        tool: ToolName,
        #[source]
        source: serde_json::Error,
    },

    #[error("arguments do not match {tool} schema: {source}")]
    SchemaMismatch {
        tool: ToolName,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentRefArgs {
    pub content_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchSourcesArgs {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentWriteArgs {
    pub content_id: String,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditSectionArgs {
    pub section_id: String,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditMetadataArgs {
    pub content_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsertImageArgs {
    pub content_id: String,
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateContentArgs {
    pub source_id: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IngestSourceArgs {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A parsed, typed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ChatToolInvocation {
    ReadContent(ContentRefArgs),
    ListSections(ContentRefArgs),
    SearchSources(SearchSourcesArgs),
    ContentWrite(ContentWriteArgs),
    EditSection(EditSectionArgs),
    EditMetadata(EditMetadataArgs),
    InsertImage(InsertImageArgs),
    GenerateContent(GenerateContentArgs),
    IngestSource(IngestSourceArgs),
}

impl ChatToolInvocation {
    /// Parse a model-issued call. Empty argument strings count as `{}`.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, InvocationParseError> {
        let tool: ToolName = name.parse()?;
        let raw = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|source| InvocationParseError::InvalidJson { tool, source })?;
        Self::from_value(tool, value)
    }

    /// Build an invocation from already-decoded JSON arguments.
    pub fn from_value(
        tool: ToolName,
        value: serde_json::Value,
    ) -> Result<Self, InvocationParseError> {
        let mismatch = |source| InvocationParseError::SchemaMismatch { tool, source };
        let invocation = match tool {
            ToolName::ReadContent => Self::ReadContent(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::ListSections => Self::ListSections(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::SearchSources => Self::SearchSources(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::ContentWrite => Self::ContentWrite(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::EditSection => Self::EditSection(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::EditMetadata => Self::EditMetadata(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::InsertImage => Self::InsertImage(serde_json::from_value(value).map_err(mismatch)?),
            ToolName::GenerateContent => {
                Self::GenerateContent(serde_json::from_value(value).map_err(mismatch)?)
            }
            ToolName::IngestSource => Self::IngestSource(serde_json::from_value(value).map_err(mismatch)?),
        };
        Ok(invocation)
    }

    pub fn name(&self) -> ToolName {
        match self {
            Self::ReadContent(_) => ToolName::ReadContent,
            Self::ListSections(_) => ToolName::ListSections,
            Self::SearchSources(_) => ToolName::SearchSources,
            Self::ContentWrite(_) => ToolName::ContentWrite,
            Self::EditSection(_) => ToolName::EditSection,
            Self::EditMetadata(_) => ToolName::EditMetadata,
            Self::InsertImage(_) => ToolName::InsertImage,
            Self::GenerateContent(_) => ToolName::GenerateContent,
            Self::IngestSource(_) => ToolName::IngestSource,
        }
    }

    /// Arguments as a JSON object (the `arguments` half of the tagged form).
    pub fn arguments(&self) -> serde_json::Value {
        let value = match self {
            Self::ReadContent(a) | Self::ListSections(a) => serde_json::to_value(a),
            Self::SearchSources(a) => serde_json::to_value(a),
            Self::ContentWrite(a) => serde_json::to_value(a),
            Self::EditSection(a) => serde_json::to_value(a),
            Self::EditMetadata(a) => serde_json::to_value(a),
            Self::InsertImage(a) => serde_json::to_value(a),
            Self::GenerateContent(a) => serde_json::to_value(a),
            Self::IngestSource(a) => serde_json::to_value(a),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Content id the call targets, if any.
    pub fn content_id(&self) -> Option<&str> {
        match self {
            Self::ReadContent(a) | Self::ListSections(a) => Some(&a.content_id),
            Self::ContentWrite(a) => Some(&a.content_id),
            Self::EditMetadata(a) => Some(&a.content_id),
            Self::InsertImage(a) => Some(&a.content_id),
            _ => None,
        }
    }

    pub fn section_id(&self) -> Option<&str> {
        match self {
            Self::EditSection(a) => Some(&a.section_id),
            Self::InsertImage(a) => a.section_id.as_deref(),
            _ => None,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            Self::InsertImage(a) => Some(&a.file_id),
            _ => None,
        }
    }
}
