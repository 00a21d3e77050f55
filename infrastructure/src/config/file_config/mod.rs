//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! once validated.

mod logging;
mod orchestrator;
mod output;
mod provider;

pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use provider::FileProviderConfig;

use scribe_application::OrchestrationParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    ZeroValue { field: &'static str },

    #[error("model name cannot be empty ({field})")]
    EmptyModelName { field: &'static str },

    #[error("provider.base_url must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Tool loop bounds and timeouts
    pub orchestrator: FileOrchestratorConfig,
    /// Completion endpoint settings
    pub provider: FileProviderConfig,
    /// Transcript and log file locations
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.orchestrator.validate()?;
        self.provider.validate()?;
        Ok(())
    }

    /// Loop parameters for the application layer.
    ///
    /// `[orchestrator].model` wins over `[provider].model` when both are set.
    pub fn to_params(&self) -> OrchestrationParams {
        let params = self.orchestrator.to_params();
        match &self.orchestrator.model {
            Some(_) => params,
            None => params.with_model(self.provider.model.clone()),
        }
    }
}
