//! Infrastructure layer for scribe
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod reference;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLoggingConfig, FileOrchestratorConfig,
    FileOutputConfig, FileOutputFormat, FileProviderConfig,
};
pub use logging::JsonlConversationLogger;
pub use providers::OpenAiCompatibleProvider;
pub use reference::{InMemoryReferenceLookup, WorkspaceFixture};
pub use tools::{DryRunToolExecutor, JsonSchemaToolConverter};
