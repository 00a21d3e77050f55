//! Application-level configuration.
//!
//! - [`OrchestrationParams`]: tool loop control (rounds, retries, per-kind timeouts, model)

pub mod orchestration_params;

pub use orchestration_params::OrchestrationParams;
