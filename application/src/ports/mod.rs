//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod completion_provider;
pub mod conversation_logger;
pub mod reference_lookup;
pub mod tool_executor;
pub mod tool_loop_observer;
pub mod tool_schema;
