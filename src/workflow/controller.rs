//! Workflow Controller
//!
//! Owns the single active job and drives it through upload, planning and
//! execution. State lives in a watch channel: every transition replaces the
//! snapshot and wakes subscribers, and readers only ever see whole snapshots.
//!
//! ```text
//! Idle ──upload──► Uploading ──► Profiled ──prompt──► Planning ──► PlanProposed
//!   ▲                  │              ▲                  │              │
//!   │                  ▼              └──── (error) ─────┘           confirm
//! reset ◄─ any      Failed ◄───────────────────────────────── Executing ◄┘
//!                                                                 │
//!                                                                 ▼
//!                                                             Completed
//! ```
//!
//! Operations take `&self`, so a UI can run them on spawned tasks and still
//! call `reset` while one is outstanding. Each operation records the epoch it
//! started in; an answer is applied only if the epoch is unchanged and the
//! answer's job id matches the current job.

use crate::gateway::{DatasetFile, GatewayError, JobGateway};
use crate::progress::ProgressTracker;
use crate::workflow::state::{Outcome, Phase, WorkflowSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const UPLOAD_FAILED: &str = "Upload failed";
pub const PLAN_FAILED: &str = "Plan generation failed";
pub const EXECUTION_FAILED: &str = "Execution failed";

/// Default soft size advisory for uploads
pub const DEFAULT_SIZE_ADVISORY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct WorkflowController {
    gateway: Arc<dyn JobGateway>,
    state: Arc<watch::Sender<WorkflowSnapshot>>,
    size_advisory_bytes: u64,
}

impl WorkflowController {
    pub fn new(gateway: Arc<dyn JobGateway>) -> Self {
        let (tx, _rx) = watch::channel(WorkflowSnapshot::default());
        Self {
            gateway,
            state: Arc::new(tx),
            size_advisory_bytes: DEFAULT_SIZE_ADVISORY_BYTES,
        }
    }

    pub fn with_size_advisory(mut self, bytes: u64) -> Self {
        self.size_advisory_bytes = bytes;
        self
    }

    /// Receiver that yields every new snapshot
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn is_processing(&self) -> bool {
        self.state.borrow().is_processing
    }

    /// Download address of the cleaned file, once the backend announced one
    pub fn download_url(&self) -> Option<String> {
        let state = self.state.borrow();
        let result = state.result.as_ref()?;
        result.download_url.as_ref()?;
        Some(self.gateway.download_url(&result.job_id))
    }

    /// Current epoch; pass it to `upload_if_current` from work queued now
    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// Upload a dataset, replacing any previous job.
    ///
    /// Valid from `Idle` and `Failed`. Oversized files and unexpected
    /// extensions only raise an advisory; the backend decides.
    pub async fn upload(&self, file: DatasetFile) -> Outcome {
        self.start_upload(file, None).await
    }

    /// Like `upload`, but `Discarded` when the epoch moved past `epoch`,
    /// e.g. a reset happened while the caller was still reading the file.
    pub async fn upload_if_current(&self, file: DatasetFile, epoch: u64) -> Outcome {
        self.start_upload(file, Some(epoch)).await
    }

    async fn start_upload(&self, file: DatasetFile, expected_epoch: Option<u64>) -> Outcome {
        let advisory = self.advisory_for(&file);

        let mut epoch = 0;
        let mut stale = false;
        let started = self.state.send_if_modified(|s| {
            if expected_epoch.is_some_and(|expected| expected != s.epoch) {
                stale = true;
                return false;
            }
            if !matches!(s.phase, Phase::Idle | Phase::Failed) {
                return false;
            }
            epoch = s.epoch + 1;
            *s = WorkflowSnapshot {
                phase: Phase::Uploading,
                is_processing: true,
                advisory: advisory.clone(),
                ..s.cleared(epoch)
            };
            true
        });
        if stale {
            warn!(expected = ?expected_epoch, filename = %file.name, "Upload queued before reset dropped");
            return Outcome::Discarded;
        }
        if !started {
            debug!(phase = %self.phase(), "Upload skipped");
            return Outcome::Skipped;
        }

        if let Some(message) = &advisory {
            warn!(filename = %file.name, size = file.size(), "{}", message);
        }
        info!(filename = %file.name, size = file.size(), epoch, "Upload started");

        let state = self.state.clone();
        let tracker = ProgressTracker::new(Arc::new(move |percent| {
            state.send_if_modified(|s| {
                if s.epoch != epoch || s.phase != Phase::Uploading || s.progress == percent {
                    return false;
                }
                s.progress = percent;
                true
            });
        }));

        let response = self.gateway.upload(file, tracker).await;

        self.apply(epoch, None, |s| match response {
            Ok(profile) => {
                info!(job_id = %profile.job_id, total_rows = profile.total_rows, "Upload complete");
                s.phase = Phase::Profiled;
                s.job_id = Some(profile.job_id.clone());
                s.working_preview = profile.preview.clone();
                s.profile = Some(profile);
                s.progress = 100;
                s.is_processing = false;
            }
            Err(err) => {
                warn!(error = %err, "Upload failed");
                s.phase = Phase::Failed;
                s.error = Some(failure_message(&err, UPLOAD_FAILED));
                s.is_processing = false;
            }
        })
    }

    /// Ask for a new plan, replacing the proposed one.
    ///
    /// Skipped without an active job or while another call is outstanding.
    /// A failure returns the workflow to where it was; the job survives.
    pub async fn request_plan(&self, prompt: &str) -> Outcome {
        let mut epoch = 0;
        let mut job_id = String::new();
        let mut prior = Phase::Idle;
        let started = self.state.send_if_modified(|s| {
            let Some(id) = s.job_id.clone() else {
                return false;
            };
            if !matches!(
                s.phase,
                Phase::Profiled | Phase::PlanProposed | Phase::Failed | Phase::Completed
            ) {
                return false;
            }
            epoch = s.epoch + 1;
            job_id = id;
            prior = s.phase;
            s.epoch = epoch;
            s.phase = Phase::Planning;
            s.plan.clear();
            s.estimated_impact = None;
            s.error = None;
            s.is_processing = true;
            true
        });
        if !started {
            debug!(phase = %self.phase(), "Plan request skipped");
            return Outcome::Skipped;
        }

        info!(job_id = %job_id, epoch, "Plan requested");
        let response = self.gateway.generate_plan(&job_id, prompt).await;

        let response_job = match &response {
            Ok(plan) => plan.job_id.clone(),
            Err(_) => job_id.clone(),
        };

        self.apply(epoch, Some(&response_job), |s| match response {
            Ok(plan) => {
                info!(job_id = %plan.job_id, steps = plan.steps.len(), "Plan proposed");
                s.phase = Phase::PlanProposed;
                s.plan = plan.steps;
                s.estimated_impact = Some(plan.estimated_impact);
                s.plan_revision += 1;
                s.is_processing = false;
            }
            Err(err) => {
                warn!(error = %err, "Plan generation failed");
                // the proposed plan was cleared at call start
                s.phase = match prior {
                    Phase::PlanProposed => Phase::Profiled,
                    other => other,
                };
                s.error = Some(failure_message(&err, PLAN_FAILED));
                s.is_processing = false;
            }
        })
    }

    /// Execute the proposed plan.
    ///
    /// A result with status `completed` ends in `Completed`; any other status
    /// ends in `Failed` with the backend's error.
    pub async fn confirm_plan(&self) -> Outcome {
        let mut epoch = 0;
        let mut job_id = String::new();
        let started = self.state.send_if_modified(|s| {
            let Some(id) = s.job_id.clone() else {
                return false;
            };
            if s.phase != Phase::PlanProposed || s.plan.is_empty() {
                return false;
            }
            epoch = s.epoch + 1;
            job_id = id;
            s.epoch = epoch;
            s.phase = Phase::Executing;
            s.result = None;
            s.error = None;
            s.is_processing = true;
            true
        });
        if !started {
            debug!(phase = %self.phase(), "Confirm skipped");
            return Outcome::Skipped;
        }

        info!(job_id = %job_id, epoch, "Plan confirmed");
        let response = self.gateway.execute(&job_id, true).await;

        let response_job = match &response {
            Ok(result) => result.job_id.clone(),
            Err(_) => job_id.clone(),
        };

        self.apply(epoch, Some(&response_job), |s| {
            s.is_processing = false;
            match response {
                Ok(result) => {
                    info!(job_id = %result.job_id, status = %result.status, "Execution result received");
                    if result.status == crate::types::JobStatus::Completed {
                        s.phase = Phase::Completed;
                    } else {
                        s.phase = Phase::Failed;
                        s.error = Some(
                            result
                                .error
                                .clone()
                                .unwrap_or_else(|| EXECUTION_FAILED.to_string()),
                        );
                    }
                    s.result = Some(result);
                    s.result_revision += 1;
                }
                Err(err) => {
                    warn!(error = %err, "Execution request failed");
                    s.phase = Phase::Failed;
                    s.error = Some(failure_message(&err, EXECUTION_FAILED));
                }
            }
        })
    }

    /// Drop the job and everything derived from it. Outstanding answers become
    /// stale.
    pub fn reset(&self) {
        self.state.send_modify(|s| {
            let epoch = s.epoch + 1;
            *s = s.cleared(epoch);
        });
        info!("Workflow reset");
    }

    fn advisory_for(&self, file: &DatasetFile) -> Option<String> {
        if file.size() > self.size_advisory_bytes {
            Some(format!(
                "{} is {:.1} MB; files over {} MB may take a long time to process",
                file.name,
                file.size() as f64 / (1024.0 * 1024.0),
                self.size_advisory_bytes / (1024 * 1024)
            ))
        } else if !file.has_supported_extension() {
            Some(format!(
                "{} does not look like a CSV or Excel file",
                file.name
            ))
        } else {
            None
        }
    }

    /// Apply an answer if it is still current
    fn apply(
        &self,
        epoch: u64,
        job_id: Option<&str>,
        update: impl FnOnce(&mut WorkflowSnapshot),
    ) -> Outcome {
        let mut outcome = Outcome::Discarded;
        self.state.send_if_modified(|s| {
            if s.epoch != epoch {
                return false;
            }
            if let Some(id) = job_id {
                if s.job_id.as_deref() != Some(id) {
                    return false;
                }
            }
            update(s);
            outcome = Outcome::Applied;
            true
        });

        if outcome == Outcome::Discarded {
            warn!(epoch, job_id = ?job_id, "Discarding stale response");
        }
        outcome
    }
}

/// Server detail when there is one, otherwise the stage default
fn failure_message(err: &GatewayError, fallback: &str) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
