//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation transcript; disabled when unset.
    pub transcript_path: Option<PathBuf>,
    /// Directory for daily-rolling tracing logs; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}
