//! Presentation layer for scribe
//!
//! This crate contains CLI definitions, output formatters
//! and progress reporters for the tool loop.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{ChatArgs, Cli, Command, ModeArg, OutputFormat, ResolveArgs};
pub use output::console::{ConsoleFormatter, configure_color};
pub use progress::reporter::{SimpleToolProgress, ToolProgressReporter};
