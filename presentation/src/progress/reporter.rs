//! Progress reporting for tool loop execution

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use scribe_application::ToolLoopObserver;
use scribe_application::use_cases::tool_helpers::invocation_preview;
use scribe_domain::{ChatToolInvocation, ToolExecutionResult, ToolName};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Reports tool loop progress with spinners, one per running tool call
pub struct ToolProgressReporter {
    multi: MultiProgress,
    thinking: Mutex<Option<ProgressBar>>,
    tools: Mutex<HashMap<String, ProgressBar>>,
}

impl ToolProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            thinking: Mutex::new(None),
            tools: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn spinner(&self, prefix: String, message: String) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(prefix);
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    fn stop_thinking(&self) {
        let pb = self.thinking.lock().ok().and_then(|mut thinking| thinking.take());
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    }
}

impl Default for ToolProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolLoopObserver for ToolProgressReporter {
    fn on_llm_chunk(&self, _chunk: &str) {
        let Ok(mut thinking) = self.thinking.lock() else {
            return;
        };
        match thinking.as_ref() {
            Some(pb) => pb.inc(1),
            None => {
                *thinking = Some(self.spinner("model".to_string(), "streaming...".to_string()));
            }
        }
    }

    fn on_retry(&self, invocation: &ChatToolInvocation, retry_count: u32) {
        let _ = self.multi.println(format!(
            "  {} retrying {} (attempt {})",
            "~".yellow(),
            invocation.name(),
            retry_count + 1
        ));
    }

    fn on_tool_start(&self, tool_call_id: &str, invocation: &ChatToolInvocation) {
        self.stop_thinking();
        let pb = self.spinner(
            invocation.name().to_string(),
            invocation_preview(invocation),
        );
        if let Ok(mut tools) = self.tools.lock() {
            tools.insert(tool_call_id.to_string(), pb);
        }
    }

    fn on_tool_progress(&self, tool_call_id: &str, _tool: ToolName, message: &str) {
        if let Ok(tools) = self.tools.lock() {
            if let Some(pb) = tools.get(tool_call_id) {
                pb.set_message(message.to_string());
            }
        }
    }

    fn on_tool_complete(&self, tool_call_id: &str, tool: ToolName, result: &ToolExecutionResult) {
        let line = if result.is_success() {
            format!("  {} {}", "v".green(), tool)
        } else {
            format!("  {} {} {}", "x".red(), tool, result.error_message().dimmed())
        };

        let pb = self
            .tools
            .lock()
            .ok()
            .and_then(|mut tools| tools.remove(tool_call_id));
        match pb {
            Some(pb) => pb.finish_with_message(line),
            // Rejected and skipped calls never started a spinner
            None => {
                let _ = self.multi.println(line);
            }
        }
    }

    fn on_final_message(&self, _message: &str) {
        self.stop_thinking();
    }
}

/// Simple line-based progress on stderr (no spinners)
pub struct SimpleToolProgress;

impl ToolLoopObserver for SimpleToolProgress {
    fn on_retry(&self, invocation: &ChatToolInvocation, retry_count: u32) {
        eprintln!(
            "  {} retrying {} (attempt {})",
            "~".yellow(),
            invocation.name(),
            retry_count + 1
        );
    }

    fn on_tool_start(&self, _tool_call_id: &str, invocation: &ChatToolInvocation) {
        eprintln!(
            "{} {} {}",
            "->".cyan(),
            invocation.name().to_string().bold(),
            invocation_preview(invocation).dimmed()
        );
    }

    fn on_tool_progress(&self, _tool_call_id: &str, _tool: ToolName, message: &str) {
        eprintln!("   {}", message.dimmed());
    }

    fn on_tool_complete(&self, _tool_call_id: &str, tool: ToolName, result: &ToolExecutionResult) {
        if result.is_success() {
            eprintln!("  {} {}", "v".green(), tool);
        } else {
            eprintln!("  {} {} ({})", "x".red(), tool, result.error_message());
        }
    }
}
