//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod resolve_references;
pub mod run_tool_loop;
pub(crate) mod shared;
pub mod tool_helpers;
