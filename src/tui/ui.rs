//! UI Rendering
//!
//! Main layout: header, workflow progress, transcript, input line, status bar,
//! with the diff and help views drawn as overlays.

use crate::tui::app::{App, BackendStatus, View};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use crate::types::ConversationRole;
use crate::workflow::Phase;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Rows taken by everything except the transcript body
pub const CHROME_HEIGHT: u16 = 3 + 4 + 3 + 1 + 2;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(4),  // Progress
            Constraint::Min(6),     // Transcript
            Constraint::Length(3),  // Input
            Constraint::Length(1),  // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    widgets::render_progress(frame, chunks[1], &app.snapshot);
    render_messages(frame, chunks[2], app);
    render_input(frame, chunks[3], app);
    render_status_bar(frame, chunks[4], app);

    match app.view {
        View::Diff => widgets::render_diff(frame, &app.snapshot),
        View::Help => render_help(frame),
        View::Chat => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let dot = match app.backend {
        BackendStatus::Online => Span::styled(Icons::DOT, Theme::complete()),
        BackendStatus::Offline => Span::styled(Icons::DOT, Theme::error()),
        BackendStatus::Checking => Span::styled(Icons::DOT, Theme::pending()),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled("FRIDATA", Theme::title()),
        Span::styled(" data cleaning  ", Theme::text_secondary()),
        dot,
        Span::styled(format!(" {}", app.config.gateway.base_url), Theme::text_dim()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    frame.render_widget(title, area);
}

/// Transcript rendered to lines wrapped at `width`
pub fn transcript_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let indent = "  ";
    let max_width = (width as usize).saturating_sub(indent.len()).max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();

    if app.transcript.is_empty() {
        for text in [
            "Welcome to FRIDATA.",
            "",
            "Load a CSV or Excel file with /upload <path>, then describe the cleanup",
            "you want. Review the proposed plan and press Ctrl+Y to run it.",
            "Press F1 for help.",
        ] {
            lines.push(Line::from(Span::styled(text, Theme::text_secondary())));
        }
    }

    for entry in app.transcript.entries() {
        let (prefix, style) = match entry.role {
            ConversationRole::User => ("You", Theme::user_message()),
            ConversationRole::Ai => ("FRIDATA", Theme::ai_message()),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", prefix), style),
            Span::styled(entry.timestamp.format("%H:%M:%S").to_string(), Theme::text_dim()),
        ]));

        for line in entry.content.lines() {
            if line.is_empty() {
                lines.push(Line::from(indent));
                continue;
            }
            for chunk in wrap_line(line, max_width) {
                lines.push(Line::from(vec![
                    Span::raw(indent),
                    Span::styled(chunk, Theme::text()),
                ]));
            }
        }
        lines.push(Line::from(""));
    }

    if matches!(app.snapshot.phase, Phase::Planning | Phase::Executing) {
        let spinner = SPINNER[app.tick % SPINNER.len()];
        lines.push(Line::from(vec![
            Span::styled("FRIDATA: ", Theme::ai_message()),
            Span::styled(spinner, Theme::active()),
        ]));
    }

    if app.snapshot.phase == Phase::Completed {
        if let Some(url) = app.download_url() {
            lines.push(Line::from(vec![
                Span::styled("Download: ", Theme::text_secondary()),
                Span::styled(url, Theme::title()),
            ]));
        }
    }

    lines
}

/// Split a line into chunks of at most `max_width` characters, preferring
/// to break after whitespace or punctuation
pub fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut chunks = Vec::new();
    let mut remaining = line;

    while remaining.chars().count() > max_width {
        let mut break_at = None;
        let mut end = remaining.len();
        for (seen, (idx, ch)) in remaining.char_indices().enumerate() {
            if seen == max_width {
                end = idx;
                if ch.is_whitespace() {
                    break_at = Some(idx);
                }
                break;
            }
            if ch.is_whitespace() || matches!(ch, ',' | ';' | '.') {
                break_at = Some(idx + ch.len_utf8());
            }
        }
        let split = break_at.filter(|b| *b > 0 && *b <= end).unwrap_or(end);
        let (chunk, rest) = remaining.split_at(split);
        chunks.push(chunk.trim_end().to_string());
        remaining = rest.trim_start();
    }

    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}

fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Conversation ")
        .borders(Borders::ALL)
        .border_style(if app.view == View::Chat {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(transcript_lines(app, inner.width)).scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, inner);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.is_busy() { " Input (busy) " } else { " Input " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if app.view == View::Chat && !app.is_busy() {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&app.input, inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = &app.snapshot;
    let status = if let Some(notice) = &app.notice {
        Span::styled(notice.clone(), Theme::warning())
    } else if let Some(error) = &snapshot.error {
        Span::styled(format!("Error: {}", error), Theme::error())
    } else if snapshot.is_processing {
        Span::styled(format!("{}...", snapshot.phase.label()), Theme::active())
    } else {
        match snapshot.phase {
            Phase::Completed => Span::styled("Completed", Theme::complete()),
            phase => Span::styled(phase.label(), Theme::text_secondary()),
        }
    };

    let shortcuts = [
        (" [Enter]", " Send "),
        ("[Ctrl+Y]", " Confirm "),
        ("[Ctrl+D]", " Diff "),
        ("[Ctrl+R]", " Reset "),
        ("[Ctrl+Q]", " Quit "),
        ("[F1]", " Help"),
    ];

    let line = Line::from(
        std::iter::once(status)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts.iter().flat_map(|(key, desc)| {
                [
                    Span::styled(*key, Theme::shortcut_key()),
                    Span::styled(*desc, Theme::shortcut_desc()),
                ]
            }))
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(line), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let entry = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("{:<18}", key), Theme::shortcut_key()),
            Span::styled(desc, Theme::text()),
        ])
    };

    let help_lines = vec![
        Line::from(Span::styled("Commands", Theme::heading())),
        Line::from(""),
        entry("/upload <path>", "Load a CSV or Excel file"),
        entry("<text>", "Ask for a cleaning plan"),
        entry("/confirm", "Execute the proposed plan"),
        entry("/diff", "Show original vs. transformed preview"),
        entry("/reset", "Drop the current dataset"),
        Line::from(""),
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
        entry("Enter", "Send"),
        entry("Ctrl+Y", "Confirm plan"),
        entry("Ctrl+D", "Toggle diff view"),
        entry("Ctrl+R", "Reset"),
        entry("Up/Down, PgUp/PgDn", "Scroll conversation"),
        entry("Esc", "Close overlay"),
        entry("Ctrl+Q / Ctrl+C", "Quit"),
        Line::from(""),
        Line::from(Span::styled("Press Esc to close", Theme::text_dim())),
    ];

    let paragraph = Paragraph::new(help_lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border_focused()),
    );

    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_prefers_word_breaks() {
        assert_eq!(
            wrap_line("fill missing names with unknown", 12),
            vec!["fill missing", "names with", "unknown"]
        );
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap_line("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_short_and_empty_lines() {
        assert_eq!(wrap_line("ok", 10), vec!["ok"]);
        assert_eq!(wrap_line("", 10), vec![""]);
    }
}
