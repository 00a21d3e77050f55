//! Console output formatter for resolution reports and chat turns

use colored::Colorize;
use scribe_application::{TerminationReason, ToolLoopOutput};
use scribe_domain::{ReferenceScope, ReferenceToken, ResolutionOutcome};
use serde_json::json;
use std::collections::BTreeSet;

/// Enable or disable ANSI colors for everything printed afterwards.
pub fn configure_color(enabled: bool) {
    colored::control::set_override(enabled);
}

/// Formats command results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the parsed mentions, what they resolved to, and the derived scope
    pub fn format_resolution(
        tokens: &[ReferenceToken],
        outcome: &ResolutionOutcome,
        scope: &ReferenceScope,
    ) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Mentions"));
        output.push('\n');

        if tokens.is_empty() {
            output.push_str(&format!("{}\n", "No mentions found.".dimmed()));
            return output;
        }

        output.push_str(&Self::section_header("Tokens"));
        for token in tokens {
            let anchor = token
                .anchor
                .as_ref()
                .map(|a| format!(" {}{}", a.kind.separator(), a.value))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {} {}{} {}\n",
                token.raw.bold(),
                token.identifier,
                anchor,
                format!("[{}..{}]", token.start, token.end).dimmed()
            ));
        }

        if !outcome.resolved.is_empty() {
            output.push_str(&Self::section_header("Resolved"));
            for reference in &outcome.resolved {
                output.push_str(&format!(
                    "  {} {} {} {}\n",
                    "v".green(),
                    reference.token().raw.bold(),
                    format!("-> {} {}", reference.kind(), reference.label()),
                    format!("({})", reference.id()).dimmed()
                ));
            }
        }

        if !outcome.ambiguous.is_empty() {
            output.push_str(&Self::section_header("Ambiguous"));
            for ambiguous in &outcome.ambiguous {
                output.push_str(&format!("  {} {}\n", "?".yellow(), ambiguous.token.raw.bold()));
                for candidate in &ambiguous.candidates {
                    output.push_str(&format!(
                        "      {} {} {}\n",
                        candidate.kind,
                        candidate.label,
                        candidate.reference.dimmed()
                    ));
                }
            }
        }

        if !outcome.unresolved.is_empty() {
            output.push_str(&Self::section_header("Unresolved"));
            for unresolved in &outcome.unresolved {
                output.push_str(&format!(
                    "  {} {} {}\n",
                    "x".red(),
                    unresolved.token.raw.bold(),
                    format!("({})", unresolved.reason.as_str()).dimmed()
                ));
                if !unresolved.suggestions.is_empty() {
                    let suggestions: Vec<&str> = unresolved
                        .suggestions
                        .iter()
                        .map(|s| s.reference.as_str())
                        .collect();
                    output.push_str(&format!(
                        "      {} {}\n",
                        "did you mean".dimmed(),
                        suggestions.join(", ")
                    ));
                }
            }
        }

        output.push_str(&Self::section_header("Scope"));
        output.push_str(&Self::scope_line("contents", &scope.allowed_content_ids));
        output.push_str(&Self::scope_line("sections", &scope.allowed_section_ids));
        output.push_str(&Self::scope_line("files", &scope.allowed_file_ids));

        output
    }

    /// Format a resolution as JSON
    pub fn format_resolution_json(
        tokens: &[ReferenceToken],
        outcome: &ResolutionOutcome,
        scope: &ReferenceScope,
    ) -> String {
        serde_json::to_string_pretty(&json!({
            "tokens": tokens,
            "outcome": outcome,
            "scope": scope,
        }))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the result of one chat turn
    pub fn format_turn(output: &ToolLoopOutput) -> String {
        let mut text = String::new();

        if !output.tool_history.is_empty() {
            text.push_str(&Self::section_header("Tools"));
            for entry in &output.tool_history {
                if entry.result.is_success() {
                    text.push_str(&format!("  {} {}\n", "v".green(), entry.tool_name));
                } else {
                    text.push_str(&format!(
                        "  {} {} {}\n",
                        "x".red(),
                        entry.tool_name,
                        entry.result.error_message().dimmed()
                    ));
                }
            }
            text.push('\n');
        }

        match &output.final_message {
            Some(message) => {
                text.push_str(message);
                text.push('\n');
            }
            None => text.push_str(&format!("{}\n", "(no reply)".dimmed())),
        }

        let status = format!(
            "[{} after {} round(s)]",
            output.termination,
            output.rounds
        );
        let status = match output.termination {
            TerminationReason::Completed => status.dimmed(),
            TerminationReason::IterationLimit | TerminationReason::Cancelled => status.yellow(),
            TerminationReason::ProviderFailure | TerminationReason::PermanentToolFailure => {
                status.red()
            }
        };
        text.push_str(&format!("\n{}\n", status));

        if let Some(id) = &output.content_id {
            text.push_str(&format!("{} {}\n", "content:".cyan(), id));
        }
        if let Some(id) = &output.source_content_id {
            text.push_str(&format!("{} {}\n", "source content:".cyan(), id));
        }

        text
    }

    /// Format a chat turn as JSON
    pub fn format_turn_json(output: &ToolLoopOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn scope_line(label: &str, ids: &BTreeSet<String>) -> String {
        let value = if ids.is_empty() {
            "-".to_string()
        } else {
            ids.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        format!("  {:<9} {}\n", label, value)
    }
}
