//! Domain error types

use crate::tool::entities::UnknownToolError;
use crate::tool::invocation::InvocationParseError;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error(transparent)]
    UnknownTool(#[from] UnknownToolError),

    #[error(transparent)]
    InvalidInvocation(#[from] InvocationParseError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
