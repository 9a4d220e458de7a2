//! Diff Widget
//!
//! The original preview as a table, each cell colored by its diff status.
//! Changed cells show `old → new`.

use crate::diff::CellStatus;
use crate::tui::theme::Theme;
use crate::tui::ui::centered_rect;
use crate::types::cell_text;
use crate::workflow::WorkflowSnapshot;
use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render_diff(frame: &mut Frame, snapshot: &WorkflowSnapshot) {
    let area = centered_rect(90, 80, frame.area());
    frame.render_widget(Clear, area);

    let Some(profile) = &snapshot.profile else {
        let empty = Paragraph::new("No dataset loaded. Use /upload <path> first.")
            .style(Theme::text_dim())
            .block(diff_block(" Preview ".to_string()));
        frame.render_widget(empty, area);
        return;
    };

    let grid = snapshot.diff();
    let transformed = snapshot.transformed_preview();

    let title = match &grid {
        Some(grid) => {
            let summary = grid.summary();
            format!(
                " Diff: {} changed cells, {} removed rows ",
                summary.changed, summary.removed_rows
            )
        }
        None => format!(" Preview: {} ", profile.filename),
    };

    let header = Row::new(profile.columns.iter().map(|column| {
        Cell::from(vec![
            Line::from(Span::styled(column.name.clone(), Theme::table_header())),
            Line::from(Span::styled(
                format!("{}, {} null", column.dtype, column.null_count),
                Theme::text_dim(),
            )),
        ])
    }))
    .height(2);

    let row_count = grid
        .as_ref()
        .map(|g| g.row_count())
        .unwrap_or(profile.preview.len());

    let rows = (0..row_count).map(|r| {
        let before = profile.preview.get(r);
        let after = transformed.and_then(|rows| rows.get(r));

        Row::new(profile.columns.iter().enumerate().map(|(c, column)| {
            let status = grid
                .as_ref()
                .and_then(|g| g.status(r, c))
                .unwrap_or(CellStatus::Unchanged);
            let old = cell_text(before, &column.name);
            let text = match status {
                CellStatus::Changed => format!("{} → {}", old, cell_text(after, &column.name)),
                _ => old,
            };
            Cell::from(text).style(Theme::diff_cell(status))
        }))
    });

    let widths = vec![Constraint::Fill(1); profile.columns.len().max(1)];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(diff_block(title));

    frame.render_widget(table, area);

    if grid.is_none() && !profile.preview.is_empty() {
        let hint_area = Rect {
            y: area.y + area.height.saturating_sub(2),
            height: 1,
            x: area.x + 2,
            width: area.width.saturating_sub(4),
        };
        let hint = Paragraph::new("Changes appear here once a plan has been executed.")
            .style(Theme::text_dim())
            .wrap(Wrap { trim: true });
        frame.render_widget(hint, hint_area);
    }
}

fn diff_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Theme::border_focused())
}
