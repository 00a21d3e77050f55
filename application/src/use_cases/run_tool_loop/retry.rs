//! Turn-scoped retry accounting.

use scribe_domain::{ChatMessage, ToolExecutionResult, ToolFingerprint, ToolHistoryEntry};
use std::collections::HashMap;

/// Consecutive failure counts per fingerprint.
///
/// A failure increments the count, a success clears it. A fingerprint whose
/// count reached the bound is not executed again this turn.
#[derive(Debug, Default)]
pub(super) struct RetryLedger {
    failures: HashMap<ToolFingerprint, u32>,
}

impl RetryLedger {
    pub(super) fn failures(&self, fingerprint: &ToolFingerprint) -> u32 {
        self.failures.get(fingerprint).copied().unwrap_or(0)
    }

    pub(super) fn is_exhausted(&self, fingerprint: &ToolFingerprint, max_retries: u32) -> bool {
        self.failures(fingerprint) >= max_retries
    }

    pub(super) fn record(&mut self, fingerprint: ToolFingerprint, success: bool) {
        if success {
            self.failures.remove(&fingerprint);
        } else {
            *self.failures.entry(fingerprint).or_insert(0) += 1;
        }
    }
}

/// Everything one turn accumulates. Owned by a single loop invocation.
#[derive(Debug, Default)]
pub(super) struct TurnState {
    pub(super) messages: Vec<ChatMessage>,
    pub(super) history: Vec<ToolHistoryEntry>,
    pub(super) ledger: RetryLedger,
    pub(super) content_id: Option<String>,
    pub(super) source_content_id: Option<String>,
}

impl TurnState {
    /// Log an attempt and update retry counts and correlation ids.
    pub(super) fn record_attempt(&mut self, fingerprint: ToolFingerprint, entry: ToolHistoryEntry) {
        let result: &ToolExecutionResult = &entry.result;
        if result.success {
            if let Some(id) = &result.content_id {
                self.content_id = Some(id.clone());
            }
            if let Some(id) = &result.source_content_id {
                self.source_content_id = Some(id.clone());
            }
        }
        self.ledger.record(fingerprint, result.success);
        self.history.push(entry);
    }
}
