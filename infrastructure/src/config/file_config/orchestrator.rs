//! Tool loop configuration from TOML (`[orchestrator]` section)

use super::ConfigValidationError;
use scribe_application::OrchestrationParams;
use scribe_domain::TimeoutClass;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw orchestrator configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Completion rounds per turn
    pub max_tool_iterations: usize,
    /// Failures allowed per identical call before giving up on it
    pub max_tool_retries: u32,
    pub generation_timeout_seconds: u64,
    pub ingestion_timeout_seconds: u64,
    pub standard_timeout_seconds: u64,
    /// Overrides `[provider].model` when set
    pub model: Option<String>,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        let params = OrchestrationParams::default();
        Self {
            max_tool_iterations: params.max_tool_iterations,
            max_tool_retries: params.max_tool_retries,
            generation_timeout_seconds: params.generation_timeout.as_secs(),
            ingestion_timeout_seconds: params.ingestion_timeout.as_secs(),
            standard_timeout_seconds: params.standard_timeout.as_secs(),
            model: None,
        }
    }
}

impl FileOrchestratorConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigValidationError> {
        let counts = [
            ("orchestrator.max_tool_iterations", self.max_tool_iterations as u64),
            ("orchestrator.generation_timeout_seconds", self.generation_timeout_seconds),
            ("orchestrator.ingestion_timeout_seconds", self.ingestion_timeout_seconds),
            ("orchestrator.standard_timeout_seconds", self.standard_timeout_seconds),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigValidationError::ZeroValue { field });
            }
        }

        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyModelName {
                field: "orchestrator.model",
            });
        }
        Ok(())
    }

    pub(super) fn to_params(&self) -> OrchestrationParams {
        let mut params = OrchestrationParams::default()
            .with_max_tool_iterations(self.max_tool_iterations)
            .with_max_tool_retries(self.max_tool_retries)
            .with_timeout(
                TimeoutClass::Generation,
                Duration::from_secs(self.generation_timeout_seconds),
            )
            .with_timeout(
                TimeoutClass::Ingestion,
                Duration::from_secs(self.ingestion_timeout_seconds),
            )
            .with_timeout(
                TimeoutClass::Standard,
                Duration::from_secs(self.standard_timeout_seconds),
            );
        if let Some(model) = &self.model {
            params = params.with_model(model.clone());
        }
        params
    }
}
