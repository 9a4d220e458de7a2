//! Event Handling
//!
//! Turns terminal key presses and timer ticks into `AppAction`s.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Actions that can be performed in the application
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Quit,
    ForceQuit,
    /// Submit the input line (prompt or slash command)
    Submit,
    /// Execute the proposed plan
    Confirm,
    /// Drop the current job
    Reset,
    ToggleDiff,
    ToggleHelp,
    /// Close the overlay
    Escape,
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    /// Key forwarded to the input line
    Input(KeyEvent),
    Tick,
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppAction>,
    _tx: mpsc::Sender<AppAction>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let tx_clone = tx.clone();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);

            loop {
                let tick = tick_interval.tick();
                let crossterm_event = reader.next().fuse();

                tokio::select! {
                    _ = tick => {
                        if tx_clone.send(AppAction::Tick).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        if let Some(action) = Self::map_event(evt) {
                            if tx_clone.send(action).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Wait for the next action
    pub async fn next(&mut self) -> Option<AppAction> {
        self.rx.recv().await
    }

    fn map_event(event: Event) -> Option<AppAction> {
        match event {
            // Windows reports releases as well
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key_event(key),
            _ => None,
        }
    }
}

/// Map a key press to an action
pub fn map_key_event(key: KeyEvent) -> Option<AppAction> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(AppAction::ForceQuit),
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => Some(AppAction::Quit),

        (KeyModifiers::CONTROL, KeyCode::Char('y')) => Some(AppAction::Confirm),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => Some(AppAction::Reset),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => Some(AppAction::ToggleDiff),

        (KeyModifiers::NONE, code) | (KeyModifiers::SHIFT, code) => match code {
            KeyCode::Esc => Some(AppAction::Escape),
            KeyCode::Enter => Some(AppAction::Submit),
            KeyCode::F(1) => Some(AppAction::ToggleHelp),

            KeyCode::Up => Some(AppAction::ScrollUp),
            KeyCode::Down => Some(AppAction::ScrollDown),
            KeyCode::PageUp => Some(AppAction::ScrollPageUp),
            KeyCode::PageDown => Some(AppAction::ScrollPageDown),

            _ => Some(AppAction::Input(key)),
        },

        _ => Some(AppAction::Input(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(modifiers: KeyModifiers, code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_workflow_shortcuts() {
        assert_eq!(
            map_key_event(key(KeyModifiers::CONTROL, KeyCode::Char('y'))),
            Some(AppAction::Confirm)
        );
        assert_eq!(
            map_key_event(key(KeyModifiers::CONTROL, KeyCode::Char('r'))),
            Some(AppAction::Reset)
        );
        assert_eq!(
            map_key_event(key(KeyModifiers::CONTROL, KeyCode::Char('d'))),
            Some(AppAction::ToggleDiff)
        );
        assert_eq!(
            map_key_event(key(KeyModifiers::NONE, KeyCode::F(1))),
            Some(AppAction::ToggleHelp)
        );
    }

    #[test]
    fn test_plain_characters_go_to_input() {
        let shifted = key(KeyModifiers::SHIFT, KeyCode::Char('Y'));
        assert_eq!(map_key_event(shifted), Some(AppAction::Input(shifted)));

        let plain = key(KeyModifiers::NONE, KeyCode::Char('/'));
        assert_eq!(map_key_event(plain), Some(AppAction::Input(plain)));
    }

    #[test]
    fn test_enter_submits() {
        assert_eq!(
            map_key_event(key(KeyModifiers::NONE, KeyCode::Enter)),
            Some(AppAction::Submit)
        );
    }
}
