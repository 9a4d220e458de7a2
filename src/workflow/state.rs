//! Workflow Snapshot
//!
//! Immutable view of the controller's state, published after every transition.

use crate::diff::{self, DiffGrid};
use crate::types::{DatasetProfile, ExecutionResult, Row, TransformStep};
use std::fmt;

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No dataset yet
    #[default]
    Idle,
    Uploading,
    /// Dataset profiled, waiting for a prompt
    Profiled,
    Planning,
    /// A plan waits for confirmation
    PlanProposed,
    Executing,
    Completed,
    Failed,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Uploading => "Uploading",
            Phase::Profiled => "Profiled",
            Phase::Planning => "Planning",
            Phase::PlanProposed => "Plan proposed",
            Phase::Executing => "Executing",
            Phase::Completed => "Completed",
            Phase::Failed => "Failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened to a requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gateway answered and the answer (success or failure) was applied
    Applied,
    /// Preconditions not met; nothing was called and nothing changed
    Skipped,
    /// The answer arrived after the workflow moved on and was dropped
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowSnapshot {
    pub phase: Phase,
    pub job_id: Option<String>,
    pub profile: Option<DatasetProfile>,
    /// Rows currently on display; starts as the profile preview
    pub working_preview: Vec<Row>,
    pub plan: Vec<TransformStep>,
    pub estimated_impact: Option<String>,
    pub result: Option<ExecutionResult>,
    /// The single user-visible error, replaced by every new failure
    pub error: Option<String>,
    /// Non-blocking upload warning (size, extension)
    pub advisory: Option<String>,
    pub progress: u8,
    pub is_processing: bool,
    /// Bumped on every operation start and on reset; answers carrying an
    /// older epoch are stale
    pub epoch: u64,
    /// Bumped each time a plan is stored
    pub plan_revision: u64,
    /// Bumped each time an execution result is stored
    pub result_revision: u64,
}

impl WorkflowSnapshot {
    pub fn has_job(&self) -> bool {
        self.job_id.is_some()
    }

    pub fn has_plan(&self) -> bool {
        !self.plan.is_empty()
    }

    /// True when every job-related field is back to its initial value
    pub fn is_cleared(&self) -> bool {
        self.phase == Phase::Idle
            && self.job_id.is_none()
            && self.profile.is_none()
            && self.working_preview.is_empty()
            && self.plan.is_empty()
            && self.estimated_impact.is_none()
            && self.result.is_none()
            && self.error.is_none()
            && self.advisory.is_none()
            && self.progress == 0
            && !self.is_processing
    }

    /// Fresh state that keeps only the monotonic counters of `self`
    pub(crate) fn cleared(&self, epoch: u64) -> Self {
        Self {
            epoch,
            plan_revision: self.plan_revision,
            result_revision: self.result_revision,
            ..Self::default()
        }
    }

    /// Transformed preview, present only once an execution returned one
    pub fn transformed_preview(&self) -> Option<&[Row]> {
        self.result.as_ref().and_then(|r| r.preview.as_deref())
    }

    /// Diff of the original preview against the transformed preview
    pub fn diff(&self) -> Option<DiffGrid> {
        let profile = self.profile.as_ref()?;
        diff::diff(&profile.preview, self.transformed_preview(), &profile.columns)
    }
}
