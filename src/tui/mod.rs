//! Terminal User Interface Module
//!
//! Interactive front end for the cleaning workflow, built with Ratatui.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │          FRIDATA data cleaning  ● http://localhost:8000/api  │
//! ├─ Workflow ───────────────────────────────────────────────────┤
//! │ ✓ Upload → ● Plan → ○ Review → ○ Execute → ○ Done            │
//! │ people.csv: 3 rows, 2 columns                                │
//! ├─ Conversation ───────────────────────────────────────────────┤
//! │ You: drop nulls                                              │
//! │ FRIDATA: 1. [ ] fillna: {...}                                │
//! ├─ Input ──────────────────────────────────────────────────────┤
//! │ > Describe how to clean the data, or /upload <path>          │
//! └──────────────────────────────────────────────────────────────┘
//!  Plan proposed │ [Enter] Send [Ctrl+Y] Confirm [Ctrl+D] Diff ...
//! ```

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, AppEvent, BackendStatus, View};
pub use event::{AppAction, EventHandler};

use crate::config::Config;
use crate::gateway::JobGateway;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI until the user quits
pub async fn run(config: Config, gateway: Arc<dyn JobGateway>) -> anyhow::Result<()> {
    info!("Starting TUI mode");

    let tick = Duration::from_millis(config.ui.tick_ms.max(10));
    let mut terminal = init_terminal()?;

    let mut app = App::new(config, gateway);
    app.check_backend();

    let mut events = EventHandler::new(tick);

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

async fn run_app(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> anyhow::Result<()> {
    loop {
        app.poll_events();

        let size = terminal.size()?;
        let viewport = size.height.saturating_sub(ui::CHROME_HEIGHT);
        let content = ui::transcript_lines(app, size.width.saturating_sub(2)).len();
        app.update_scroll_bounds(u16::try_from(content).unwrap_or(u16::MAX), viewport);

        terminal.draw(|frame| ui::render(frame, app))?;

        // ticks keep this loop turning even without key presses
        match events.next().await {
            Some(action) => app.handle_action(action),
            None => break,
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI exited normally");
    Ok(())
}
