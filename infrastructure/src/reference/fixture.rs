//! Workspace fixture files.
//!
//! A fixture is a TOML snapshot of one organization's workspace: uploaded
//! files, content items with their sections, and ingested sources.
//!
//! ```toml
//! organization_id = "acme"
//!
//! [[files]]
//! id = "f1"
//! name = "report.pdf"
//!
//! [[contents]]
//! id = "c1"
//! slug = "acme-launch"
//! title = "Acme Launch"
//!
//! [[contents.sections]]
//! id = "sec_0"
//! title = "Intro"
//! body = "We are launching..."
//!
//! [[sources]]
//! id = "src-1"
//! external_id = "yt-42"
//! title = "Keynote"
//! status = "ready"
//! ```

use scribe_domain::{ContentRecord, FileRecord, SectionRecord, SourceRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read workspace file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workspace file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Duplicate id '{0}' in workspace file")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSection {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl FixtureSection {
    pub fn record(&self) -> SectionRecord {
        SectionRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            section_type: self.section_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureContent {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sections: Vec<FixtureSection>,
}

impl FixtureContent {
    pub fn record(&self) -> ContentRecord {
        ContentRecord {
            id: self.id.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
            status: self.status.clone(),
        }
    }
}

fn default_status() -> String {
    "draft".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceFixture {
    pub organization_id: String,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub contents: Vec<FixtureContent>,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

impl WorkspaceFixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: display.clone(),
            source,
        })?;
        let fixture: Self = toml::from_str(&raw).map_err(|source| FixtureError::Parse {
            path: display,
            source,
        })?;
        fixture.check_unique_ids()?;
        Ok(fixture)
    }

    fn check_unique_ids(&self) -> Result<(), FixtureError> {
        let mut seen = std::collections::HashSet::new();
        let ids = self
            .files
            .iter()
            .map(|f| &f.id)
            .chain(self.contents.iter().map(|c| &c.id))
            .chain(self.contents.iter().flat_map(|c| c.sections.iter().map(|s| &s.id)))
            .chain(self.sources.iter().map(|s| &s.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(FixtureError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }

    pub fn content(&self, id: &str) -> Option<&FixtureContent> {
        self.contents.iter().find(|c| c.id == id)
    }

    pub fn source(&self, id: &str) -> Option<&SourceRecord> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn file(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Content item owning the section, with the section itself.
    pub fn section(&self, id: &str) -> Option<(&FixtureContent, &FixtureSection)> {
        self.contents
            .iter()
            .find_map(|c| c.sections.iter().find(|s| s.id == id).map(|s| (c, s)))
    }
}
