//! Headless Runner
//!
//! Drives one dataset through upload, planning and (optionally) execution
//! without a terminal UI, printing the transcript and the preview diff.

use crate::diff::CellStatus;
use crate::gateway::DatasetFile;
use crate::transcript::TranscriptBuilder;
use crate::types::{cell_text, AppError, AppResult};
use crate::workflow::{Phase, WorkflowController, WorkflowSnapshot};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: PathBuf,
    pub prompt: String,
    /// Execute the plan without asking
    pub confirm: bool,
}

/// Final state of a headless run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub phase: Phase,
    pub download_url: Option<String>,
}

pub async fn run_headless<W: Write>(
    controller: &WorkflowController,
    options: &RunOptions,
    out: &mut W,
) -> AppResult<RunSummary> {
    let prompt = options.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::InvalidRequest("prompt must not be empty".to_string()));
    }

    let file = DatasetFile::open(&options.file).await?;
    let mut transcript = TranscriptBuilder::new();
    let mut printed = 0;

    info!(path = %options.file.display(), "Headless run started");
    controller.upload(file).await;
    let snapshot = controller.snapshot();
    if let Some(advisory) = &snapshot.advisory {
        writeln!(out, "Warning: {}", advisory)?;
    }
    ensure_not_failed(&snapshot, "Upload")?;
    if let Some(profile) = &snapshot.profile {
        writeln!(
            out,
            "Loaded {}: {} rows, {} columns (job {})",
            profile.filename,
            profile.total_rows,
            profile.column_count(),
            profile.job_id
        )?;
        for column in &profile.columns {
            writeln!(
                out,
                "  {:<20} {:<10} {} null, {} unique",
                column.name, column.dtype, column.null_count, column.unique_count
            )?;
        }
        writeln!(out)?;
    }

    transcript.record_prompt(prompt);
    controller.request_plan(prompt).await;
    let snapshot = controller.snapshot();
    transcript.observe(&snapshot);
    printed = print_entries(&transcript, printed, out)?;
    if snapshot.phase != Phase::PlanProposed {
        return Err(workflow_error(&snapshot, "Planning"));
    }

    if !options.confirm {
        writeln!(out, "Plan not executed; pass --yes to run it.")?;
        return Ok(RunSummary {
            phase: snapshot.phase,
            download_url: None,
        });
    }

    transcript.record_confirm();
    controller.confirm_plan().await;
    let snapshot = controller.snapshot();
    transcript.observe(&snapshot);
    print_entries(&transcript, printed, out)?;

    if let Some(diff) = render_diff_text(&snapshot) {
        writeln!(out, "{}", diff)?;
    }

    let download_url = controller.download_url();
    if let Some(url) = &download_url {
        writeln!(out, "Download: {}", url)?;
    }

    ensure_not_failed(&snapshot, "Execution")?;
    Ok(RunSummary {
        phase: snapshot.phase,
        download_url,
    })
}

fn ensure_not_failed(snapshot: &WorkflowSnapshot, stage: &'static str) -> AppResult<()> {
    if snapshot.phase == Phase::Failed {
        return Err(workflow_error(snapshot, stage));
    }
    Ok(())
}

fn workflow_error(snapshot: &WorkflowSnapshot, stage: &'static str) -> AppError {
    AppError::Workflow {
        stage,
        message: snapshot
            .error
            .clone()
            .unwrap_or_else(|| format!("ended in {}", snapshot.phase)),
    }
}

/// Print entries from `from` on; returns the new count
fn print_entries<W: Write>(transcript: &TranscriptBuilder, from: usize, out: &mut W) -> AppResult<usize> {
    for entry in &transcript.entries()[from..] {
        let who = match entry.role {
            crate::types::ConversationRole::User => "You",
            crate::types::ConversationRole::Ai => "FRIDATA",
        };
        writeln!(out, "{}: {}\n", who, entry.content)?;
    }
    Ok(transcript.len())
}

/// Plain-text diff of the preview.
///
/// Rows are prefixed `-` when missing from the transformed preview and `~`
/// when any cell changed; changed cells read `old -> new`.
pub fn render_diff_text(snapshot: &WorkflowSnapshot) -> Option<String> {
    let grid = snapshot.diff()?;
    let profile = snapshot.profile.as_ref()?;
    let transformed = snapshot.transformed_preview();

    let mut lines = Vec::with_capacity(grid.row_count() + 2);
    let summary = grid.summary();
    lines.push(format!(
        "Preview diff: {} changed cells, {} removed rows",
        summary.changed, summary.removed_rows
    ));
    lines.push(format!(
        "  {}",
        profile
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    ));

    for (r, statuses) in grid.rows().iter().enumerate() {
        let before = profile.preview.get(r);
        let after = transformed.and_then(|rows| rows.get(r));

        let marker = if grid.is_removed(r) {
            '-'
        } else if statuses.contains(&CellStatus::Changed) {
            '~'
        } else {
            ' '
        };

        let cells: Vec<String> = profile
            .columns
            .iter()
            .zip(statuses)
            .map(|(column, status)| {
                let old = cell_text(before, &column.name);
                match status {
                    CellStatus::Changed => format!("{} -> {}", old, cell_text(after, &column.name)),
                    _ => old,
                }
            })
            .collect();

        lines.push(format!("{} {}", marker, cells.join(" | ")));
    }

    Some(lines.join("\n"))
}
