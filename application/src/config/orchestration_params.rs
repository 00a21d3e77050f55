//! Orchestration parameters: tool loop control.
//!
//! [`OrchestrationParams`] groups the static parameters that bound a turn in
//! [`RunToolLoopUseCase`](crate::use_cases::run_tool_loop::RunToolLoopUseCase).

use scribe_domain::{TimeoutClass, ToolName};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tool loop control parameters.
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `max_tool_iterations` | 5 rounds |
/// | `max_tool_retries` | 2 failures per fingerprint |
/// | `generation_timeout` | 300 s |
/// | `ingestion_timeout` | 180 s |
/// | `standard_timeout` | 120 s |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationParams {
    /// Maximum completion rounds per turn.
    pub max_tool_iterations: usize,
    /// Failures allowed per fingerprint before it is routed to permanent failure.
    pub max_tool_retries: u32,
    pub generation_timeout: Duration,
    pub ingestion_timeout: Duration,
    pub standard_timeout: Duration,
    /// Model name sent with every completion request.
    pub model: String,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            max_tool_iterations: 5,
            max_tool_retries: 2,
            generation_timeout: TimeoutClass::Generation.default_duration(),
            ingestion_timeout: TimeoutClass::Ingestion.default_duration(),
            standard_timeout: TimeoutClass::Standard.default_duration(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn with_max_tool_retries(mut self, max: u32) -> Self {
        self.max_tool_retries = max;
        self
    }

    pub fn with_timeout(mut self, class: TimeoutClass, timeout: Duration) -> Self {
        match class {
            TimeoutClass::Generation => self.generation_timeout = timeout,
            TimeoutClass::Ingestion => self.ingestion_timeout = timeout,
            TimeoutClass::Standard => self.standard_timeout = timeout,
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    // ==================== Lookups ====================

    pub fn timeout_for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Generation => self.generation_timeout,
            TimeoutClass::Ingestion => self.ingestion_timeout,
            TimeoutClass::Standard => self.standard_timeout,
        }
    }

    pub fn timeout_for(&self, tool: ToolName) -> Duration {
        self.timeout_for_class(tool.timeout_class())
    }
}
