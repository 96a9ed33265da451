//! Event Handling
//!
//! Maps keyboard and timer events to application actions.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Actions that can be performed in the application
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Quit the application (with confirmation if needed)
    Quit,
    /// Force quit without confirmation
    ForceQuit,
    /// Send the document in the form
    Submit,
    /// Stop tracking the current job
    CancelJob,
    /// Clear results and errors
    ClearResults,
    /// Fill the form with a sample document (zero-based)
    LoadSample(usize),
    /// Toggle help view
    ToggleHelp,
    /// Escape - close modals
    Escape,
    /// Scroll results up one line
    ScrollUp,
    /// Scroll results down one line
    ScrollDown,
    /// Scroll results up one page
    ScrollPageUp,
    /// Scroll results down one page
    ScrollPageDown,
    /// Move to next field (Tab)
    NextField,
    /// Move to previous field (Shift+Tab)
    PrevField,
    /// Regular input for the focused field
    Input(KeyEvent),
    /// Timer tick for toasts and elapsed time
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::Receiver<AppAction>,
    _tx: mpsc::Sender<AppAction>,
}

impl EventHandler {
    /// Create a new event handler with specified tick rate
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
            Event::Key(key) if key.kind != KeyEventKind::Release => map_key_event(key),
            _ => None,
        }
    }
}

/// Map a key event to an app action
pub fn map_key_event(key: KeyEvent) -> Option<AppAction> {
    match (key.modifiers, key.code) {
        // Quit shortcuts
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(AppAction::ForceQuit),
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => Some(AppAction::Quit),

        // Job control
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => Some(AppAction::Submit),
        (KeyModifiers::CONTROL, KeyCode::Char('x')) => Some(AppAction::CancelJob),
        (KeyModifiers::CONTROL, KeyCode::Char('l')) => Some(AppAction::ClearResults),

        // Result scrolling
        (KeyModifiers::CONTROL, KeyCode::Up) => Some(AppAction::ScrollUp),
        (KeyModifiers::CONTROL, KeyCode::Down) => Some(AppAction::ScrollDown),

        (KeyModifiers::SHIFT, KeyCode::BackTab) => Some(AppAction::PrevField),

        (KeyModifiers::NONE, code) | (KeyModifiers::SHIFT, code) => match code {
            KeyCode::Esc => Some(AppAction::Escape),
            KeyCode::F(1) => Some(AppAction::ToggleHelp),
            KeyCode::F(5) => Some(AppAction::Submit),

            // Samples 1-3
            KeyCode::F(n @ 2..=4) => Some(AppAction::LoadSample(usize::from(n - 2))),

            KeyCode::PageUp => Some(AppAction::ScrollPageUp),
            KeyCode::PageDown => Some(AppAction::ScrollPageDown),
            KeyCode::Tab => Some(AppAction::NextField),

            // Everything else goes to the focused field
            _ => Some(AppAction::Input(key)),
        },

        _ => Some(AppAction::Input(key)),
    }
}
