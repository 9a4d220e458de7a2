//! Transcript Builder
//!
//! Conversation log derived from workflow snapshots. User entries are appended
//! as soon as the intent is issued; AI entries appear when a snapshot carries a
//! plan or result the builder has not rendered yet.

use crate::types::{ConversationEntry, ExecutionResult, JobStatus, TransformStep};
use crate::workflow::controller::EXECUTION_FAILED;
use crate::workflow::WorkflowSnapshot;

pub const PLAN_PREAMBLE: &str = "Here is the proposed transformation plan:";
pub const CONFIRM_PROMPT: &str = "Review the steps above and confirm to execute the plan.";
pub const CONFIRM_MESSAGE: &str = "Confirmed. Execute the plan.";

const MISSING_METRIC: &str = "n/a";

#[derive(Debug, Default)]
pub struct TranscriptBuilder {
    entries: Vec<ConversationEntry>,
    plan_revision: u64,
    result_revision: u64,
}

impl TranscriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_prompt(&mut self, prompt: &str) {
        self.entries.push(ConversationEntry::user(prompt));
    }

    pub fn record_confirm(&mut self) {
        self.entries.push(ConversationEntry::user(CONFIRM_MESSAGE));
    }

    /// Append AI entries for any plan or result newer than the last observed.
    ///
    /// Returns the number of entries appended.
    pub fn observe(&mut self, snapshot: &WorkflowSnapshot) -> usize {
        let before = self.entries.len();

        if snapshot.plan_revision > self.plan_revision {
            self.plan_revision = snapshot.plan_revision;
            if snapshot.has_plan() {
                self.entries
                    .push(ConversationEntry::ai(render_plan(&snapshot.plan)));
            }
        }

        if snapshot.result_revision > self.result_revision {
            self.result_revision = snapshot.result_revision;
            if let Some(result) = &snapshot.result {
                self.entries.push(ConversationEntry::ai(render_result(result)));
            }
        }

        self.entries.len() - before
    }

    /// Forget all entries. Revisions already observed stay observed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

pub fn render_plan(steps: &[TransformStep]) -> String {
    let lines: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. [ ] {}: {}", i + 1, step.operation, step.parameters_text()))
        .collect();

    format!("{}\n{}\n\n{}", PLAN_PREAMBLE, lines.join("\n"), CONFIRM_PROMPT)
}

pub fn render_result(result: &ExecutionResult) -> String {
    if result.status != JobStatus::Completed {
        return result
            .error
            .clone()
            .unwrap_or_else(|| EXECUTION_FAILED.to_string());
    }

    let metric = |key: &str| {
        result
            .metric_text(key)
            .unwrap_or_else(|| MISSING_METRIC.to_string())
    };

    format!(
        "Transformation complete. {} rows in the output, processed in {}s using {} MB.",
        metric("output_rows"),
        metric("execution_time_sec"),
        metric("memory_usage_mb"),
    )
}
