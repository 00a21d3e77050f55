//! Output formatting for resolution reports and chat turns

pub mod console;
