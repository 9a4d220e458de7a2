//! Progress Widget
//!
//! Workflow stage line plus either the upload gauge or a one-line summary of
//! the current job.

use crate::tui::theme::{Icons, Theme};
use crate::workflow::{Phase, WorkflowSnapshot};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
    Frame,
};

const STAGES: [&str; 5] = ["Upload", "Plan", "Review", "Execute", "Done"];

/// State of a workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Active,
    Complete,
    Error,
}

/// Per-stage state for the stage line
pub fn stage_states(snapshot: &WorkflowSnapshot) -> [StageState; 5] {
    // number of completed stages, and the state of the one after them
    let (reached, current) = match snapshot.phase {
        Phase::Idle => (0, StageState::Pending),
        Phase::Uploading => (0, StageState::Active),
        Phase::Profiled => (1, StageState::Pending),
        Phase::Planning => (1, StageState::Active),
        Phase::PlanProposed => (2, StageState::Active),
        Phase::Executing => (3, StageState::Active),
        Phase::Completed => (STAGES.len(), StageState::Complete),
        Phase::Failed if !snapshot.has_job() => (0, StageState::Error),
        Phase::Failed => (3, StageState::Error),
    };

    let mut states = [StageState::Pending; 5];
    for (i, state) in states.iter_mut().enumerate() {
        *state = match i.cmp(&reached) {
            std::cmp::Ordering::Less => StageState::Complete,
            std::cmp::Ordering::Equal => current,
            std::cmp::Ordering::Greater => StageState::Pending,
        };
    }
    states
}

pub fn render_progress(frame: &mut Frame, area: Rect, snapshot: &WorkflowSnapshot) {
    let block = Block::default()
        .title(" Workflow ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(Paragraph::new(Line::from(stage_line(snapshot))), rows[0]);

    if snapshot.phase == Phase::Uploading {
        let gauge = LineGauge::default()
            .filled_style(Theme::gauge())
            .label(format!("{:>3}%", snapshot.progress))
            .ratio(f64::from(snapshot.progress.min(100)) / 100.0);
        frame.render_widget(gauge, rows[1]);
    } else {
        let width = rows[1].width as usize;
        frame.render_widget(Paragraph::new(summary_line(snapshot, width)), rows[1]);
    }
}

fn stage_line(snapshot: &WorkflowSnapshot) -> Vec<Span<'static>> {
    let states = stage_states(snapshot);
    let mut spans = Vec::new();

    for (i, (name, state)) in STAGES.iter().zip(states.iter()).enumerate() {
        let (icon, style) = match state {
            StageState::Complete => (Icons::COMPLETE, Theme::complete()),
            StageState::Active => (Icons::ACTIVE, Theme::active()),
            StageState::Pending => (Icons::PENDING, Theme::pending()),
            StageState::Error => (Icons::ERROR, Theme::error()),
        };

        spans.push(Span::styled(format!("{} ", icon), style));
        spans.push(Span::styled(name.to_string(), style));

        if i < STAGES.len() - 1 {
            spans.push(Span::styled(format!(" {} ", Icons::ARROW), Theme::text_dim()));
        }
    }

    spans
}

/// Job summary, and the upload advisory while it is still relevant
fn summary_parts(snapshot: &WorkflowSnapshot) -> (Option<String>, Option<&str>) {
    let summary = snapshot.profile.as_ref().map(|profile| {
        let mut text = format!(
            "{}: {} rows, {} columns",
            profile.filename,
            profile.total_rows,
            profile.column_count()
        );
        if let Some(impact) = &snapshot.estimated_impact {
            text.push_str(" | ");
            text.push_str(impact);
        }
        text
    });

    let advisory = snapshot
        .advisory
        .as_deref()
        .filter(|_| summary.is_none() || snapshot.phase == Phase::Profiled);
    (summary, advisory)
}

fn summary_line(snapshot: &WorkflowSnapshot, width: usize) -> Line<'static> {
    match summary_parts(snapshot) {
        (Some(summary), Some(advisory)) => {
            let summary = truncate_string(&summary, width);
            let rest = width.saturating_sub(summary.chars().count() + 3);
            Line::from(vec![
                Span::styled(summary, Theme::text_secondary()),
                Span::styled(" | ", Theme::text_dim()),
                Span::styled(truncate_string(advisory, rest), Theme::warning()),
            ])
        }
        (Some(summary), None) => {
            Line::from(Span::styled(truncate_string(&summary, width), Theme::text_secondary()))
        }
        (None, Some(advisory)) => {
            Line::from(Span::styled(truncate_string(advisory, width), Theme::warning()))
        }
        (None, None) => Line::from(Span::styled("No dataset loaded", Theme::text_dim())),
    }
}

/// Truncate to `max_width` characters
pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width > 3 {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_width).collect()
    }
}
