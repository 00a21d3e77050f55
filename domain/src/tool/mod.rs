//! Tool domain module
//!
//! The closed catalogue of tools a chat turn may call, how model-issued calls
//! are parsed into typed invocations, and the rules that decide whether a
//! parsed call may run.
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────┐    ┌──────────────────────┐
//! │ ToolRegistry │───▶│ ChatToolInvocation │───▶│ ToolExecutionResult  │
//! │ (catalogue)  │    │ (parsed call)      │    │ (executor outcome)   │
//! └──────┬───────┘    └─────────┬──────────┘    └──────────────────────┘
//!        │                      │
//!        │                      ├─ enforcement: mode + mention scope
//!        │                      └─ fingerprint: retry identity
//!        └─ kind (read / write / ingest), timeout class
//! ```
//!
//! | Kind | Tools | Chat mode | Agent mode |
//! |------|-------|-----------|------------|
//! | **Read** | `read_content`, `list_sections`, `search_sources` | yes | yes |
//! | **Write** | `content_write`, `edit_section`, `edit_metadata`, `insert_image`, `generate_content` | no | scope-checked |
//! | **Ingest** | `ingest_source` | no | yes |
//!
//! Everything here is pure. Execution goes through the application layer's
//! `ToolExecutorPort`.

pub mod enforcement;
pub mod entities;
pub mod fingerprint;
pub mod invocation;
pub mod value_objects;

pub use enforcement::{
    ChatMode, EnforcementContext, dispatch_error, is_tool_allowed_in_mode, mode_error_message,
    reference_scope_error, tools_for_mode, unregistered_tool_message,
};
pub use entities::{
    TimeoutClass, ToolDefinition, ToolKind, ToolName, ToolParameter, ToolRegistry,
    UnknownToolError,
};
pub use fingerprint::{ToolFingerprint, canonical_json};
pub use invocation::{ChatToolInvocation, InvocationParseError};
pub use value_objects::{ToolExecutionResult, ToolHistoryEntry};
