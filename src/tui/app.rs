//! Application State
//!
//! Holds the TUI state and turns user actions into workflow operations.
//! Operations run on spawned tasks; their effects come back through the
//! controller's snapshot channel, and completion notices through `AppEvent`s.

use crate::config::Config;
use crate::gateway::{DatasetFile, JobGateway};
use crate::transcript::TranscriptBuilder;
use crate::tui::event::AppAction;
use crate::utils::{with_retry, RetryPolicy};
use crate::workflow::{Outcome, Phase, WorkflowController, WorkflowSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

const INPUT_PLACEHOLDER: &str = "Describe how to clean the data, or /upload <path>";

/// Current view/screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Chat,
    Diff,
    Help,
}

/// Reachability of the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Plan,
    Execute,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Upload => "Upload",
            Operation::Plan => "Planning",
            Operation::Execute => "Execution",
        }
    }
}

/// Events from spawned tasks
#[derive(Debug)]
pub enum AppEvent {
    Backend(BackendStatus),
    /// A workflow operation returned
    Finished {
        token: u64,
        operation: Operation,
        outcome: Outcome,
    },
    /// The dataset file could not be read; nothing was sent
    LoadFailed { token: u64, message: String },
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Confirm,
    Reset,
    Diff,
    Help,
    Prompt(String),
}

/// Parse an input line. `Ok(None)` for blank input.
pub fn parse_command(input: &str) -> Result<Option<Command>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if !input.starts_with('/') {
        return Ok(Some(Command::Prompt(input.to_string())));
    }

    let (name, rest) = match input.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (input, ""),
    };

    let command = match name {
        "/upload" => {
            let path = rest.trim_matches(|c| c == '"' || c == '\'');
            if path.is_empty() {
                return Err("Usage: /upload <path>".to_string());
            }
            Command::Upload(expand_home(path))
        }
        "/confirm" => Command::Confirm,
        "/reset" => Command::Reset,
        "/diff" => Command::Diff,
        "/help" => Command::Help,
        other => return Err(format!("Unknown command {}; try /help", other)),
    };
    Ok(Some(command))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

pub struct App {
    pub config: Config,

    // UI State
    pub view: View,
    pub should_quit: bool,
    pub input: TextArea<'static>,
    pub scroll_offset: u16,
    pub max_scroll: u16,
    /// Keep the newest entry in view
    pub follow: bool,
    pub tick: usize,

    // Workflow State
    pub snapshot: WorkflowSnapshot,
    pub transcript: TranscriptBuilder,
    /// Local feedback that is not part of the workflow (bad command, busy)
    pub notice: Option<String>,
    pub backend: BackendStatus,

    controller: WorkflowController,
    gateway: Arc<dyn JobGateway>,
    state_rx: watch::Receiver<WorkflowSnapshot>,
    /// Operation this UI is waiting on, with its token
    in_flight: Option<(u64, Operation)>,
    next_token: u64,

    event_rx: mpsc::Receiver<AppEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    pub fn new(config: Config, gateway: Arc<dyn JobGateway>) -> Self {
        let controller = WorkflowController::new(gateway.clone())
            .with_size_advisory(config.upload.size_advisory_bytes);
        let state_rx = controller.subscribe();
        let (tx, rx) = mpsc::channel(100);

        Self {
            config,
            view: View::Chat,
            should_quit: false,
            input: new_input(),
            scroll_offset: 0,
            max_scroll: 0,
            follow: true,
            tick: 0,
            snapshot: controller.snapshot(),
            transcript: TranscriptBuilder::new(),
            notice: None,
            backend: BackendStatus::Checking,
            controller,
            gateway,
            state_rx,
            in_flight: None,
            next_token: 0,
            event_rx: rx,
            event_tx: tx,
        }
    }

    /// Probe the backend in the background
    pub fn check_backend(&self) {
        let gateway = self.gateway.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let status = match with_retry(RetryPolicy::default(), || gateway.health()).await {
                Ok(true) => BackendStatus::Online,
                Ok(false) => BackendStatus::Offline,
                Err(err) => {
                    warn!(error = %err, "Backend unreachable");
                    BackendStatus::Offline
                }
            };
            tx.send(AppEvent::Backend(status)).await.ok();
        });
    }

    /// An operation is outstanding; workflow intents are dropped
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.snapshot.is_processing
    }

    pub fn download_url(&self) -> Option<String> {
        self.controller.download_url()
    }

    /// Drain task events and pick up the latest workflow snapshot
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }

        if self.state_rx.has_changed().unwrap_or(false) {
            self.snapshot = self.state_rx.borrow_and_update().clone();
            if self.transcript.observe(&self.snapshot) > 0 {
                self.scroll_to_bottom();
            }
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Backend(status) => {
                self.backend = status;
            }
            AppEvent::Finished {
                token,
                operation,
                outcome,
            } => {
                let current = self.finish(token);
                match outcome {
                    Outcome::Applied => {}
                    Outcome::Skipped if current => {
                        self.notice = Some(format!(
                            "{} not possible while {}",
                            operation.label(),
                            self.snapshot.phase.label().to_lowercase()
                        ));
                    }
                    Outcome::Skipped | Outcome::Discarded => {
                        debug!(operation = operation.label(), ?outcome, "Late result ignored");
                    }
                }
            }
            AppEvent::LoadFailed { token, message } => {
                if self.finish(token) {
                    self.notice = Some(message);
                }
            }
        }
    }

    /// Handle a user action
    pub fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit | AppAction::ForceQuit => {
                self.should_quit = true;
            }
            AppAction::Submit => {
                if self.view == View::Chat {
                    self.submit_input();
                } else {
                    self.view = View::Chat;
                }
            }
            AppAction::Confirm => self.confirm(),
            AppAction::Reset => self.reset(),
            AppAction::ToggleDiff => self.toggle(View::Diff),
            AppAction::ToggleHelp => self.toggle(View::Help),
            AppAction::Escape => {
                self.view = View::Chat;
            }
            AppAction::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                self.follow = false;
            }
            AppAction::ScrollDown => {
                self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll);
                self.follow = self.scroll_offset == self.max_scroll;
            }
            AppAction::ScrollPageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                self.follow = false;
            }
            AppAction::ScrollPageDown => {
                self.scroll_offset = (self.scroll_offset + 10).min(self.max_scroll);
                self.follow = self.scroll_offset == self.max_scroll;
            }
            AppAction::Input(key) => {
                if self.view == View::Chat {
                    self.input.input(key);
                } else {
                    self.view = View::Chat;
                }
            }
            AppAction::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
        }
    }

    fn toggle(&mut self, view: View) {
        self.view = if self.view == view { View::Chat } else { view };
    }

    fn submit_input(&mut self) {
        let content = self.input.lines().join("\n");
        self.input = new_input();
        self.notice = None;

        match parse_command(&content) {
            Ok(Some(Command::Upload(path))) => self.upload(path),
            Ok(Some(Command::Prompt(prompt))) => self.request_plan(prompt),
            Ok(Some(Command::Confirm)) => self.confirm(),
            Ok(Some(Command::Reset)) => self.reset(),
            Ok(Some(Command::Diff)) => self.toggle(View::Diff),
            Ok(Some(Command::Help)) => self.toggle(View::Help),
            Ok(None) => {}
            Err(message) => self.notice = Some(message),
        }
    }

    /// Refuse an intent while busy; returns true when refused
    fn refuse_if_busy(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        let label = match self.in_flight {
            Some((_, operation)) => operation.label(),
            None => self.snapshot.phase.label(),
        };
        self.notice = Some(format!("{} in progress; wait or reset (Ctrl+R)", label));
        true
    }

    fn begin(&mut self, operation: Operation) -> u64 {
        self.next_token += 1;
        self.in_flight = Some((self.next_token, operation));
        self.next_token
    }

    /// Clear the outstanding operation; false when `token` was superseded
    fn finish(&mut self, token: u64) -> bool {
        if matches!(self.in_flight, Some((current, _)) if current == token) {
            self.in_flight = None;
            return true;
        }
        false
    }

    fn upload(&mut self, path: PathBuf) {
        if self.refuse_if_busy() {
            return;
        }
        if !matches!(self.snapshot.phase, Phase::Idle | Phase::Failed) {
            self.notice = Some("A dataset is already loaded; reset (Ctrl+R) first".to_string());
            return;
        }

        let token = self.begin(Operation::Upload);
        let controller = self.controller.clone();
        let tx = self.event_tx.clone();
        // a reset while the file is still being read drops this upload
        let epoch = controller.epoch();
        info!(path = %path.display(), "Uploading dataset");

        tokio::spawn(async move {
            match DatasetFile::open(&path).await {
                Ok(file) => {
                    let outcome = controller.upload_if_current(file, epoch).await;
                    tx.send(AppEvent::Finished {
                        token,
                        operation: Operation::Upload,
                        outcome,
                    })
                    .await
                    .ok();
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Cannot read dataset");
                    let message = format!("Cannot read {}: {}", path.display(), err);
                    tx.send(AppEvent::LoadFailed { token, message }).await.ok();
                }
            }
        });
    }

    fn request_plan(&mut self, prompt: String) {
        if self.refuse_if_busy() {
            return;
        }
        if !self.snapshot.has_job() {
            self.notice = Some("Upload a dataset first: /upload <path>".to_string());
            return;
        }

        self.transcript.record_prompt(&prompt);
        self.scroll_to_bottom();

        let token = self.begin(Operation::Plan);
        let controller = self.controller.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = controller.request_plan(&prompt).await;
            tx.send(AppEvent::Finished {
                token,
                operation: Operation::Plan,
                outcome,
            })
            .await
            .ok();
        });
    }

    fn confirm(&mut self) {
        if self.refuse_if_busy() {
            return;
        }
        if self.snapshot.phase != Phase::PlanProposed || !self.snapshot.has_plan() {
            self.notice = Some("No plan to confirm".to_string());
            return;
        }

        self.transcript.record_confirm();
        self.scroll_to_bottom();

        let token = self.begin(Operation::Execute);
        let controller = self.controller.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = controller.confirm_plan().await;
            tx.send(AppEvent::Finished {
                token,
                operation: Operation::Execute,
                outcome,
            })
            .await
            .ok();
        });
    }

    fn reset(&mut self) {
        self.controller.reset();
        self.transcript.clear();
        self.in_flight = None;
        self.notice = None;
        self.view = View::Chat;
        self.scroll_offset = 0;
        self.follow = true;
        self.poll_events();
    }

    fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.scroll_offset = self.max_scroll;
    }

    /// Update max scroll from the rendered transcript height
    pub fn update_scroll_bounds(&mut self, content_height: u16, viewport_height: u16) {
        self.max_scroll = content_height.saturating_sub(viewport_height);
        if self.follow || self.scroll_offset > self.max_scroll {
            self.scroll_offset = self.max_scroll;
        }
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(ratatui::style::Style::default());
    input.set_placeholder_text(INPUT_PLACEHOLDER);
    input
}
