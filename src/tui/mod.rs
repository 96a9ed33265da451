//! Terminal User Interface Module
//!
//! Interactive front end for the coding workflow, built with Ratatui.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  🩺 Medical Coding ICD-10 Workflow Client                        │
//! ├───────────────────────────┬─────────────────────────────────────┤
//! │ ┌─ Patient Name ────────┐ │ ┌─ Processing ────────────────────┐ │
//! │ └───────────────────────┘ │ │ ✓ Submit → ● Process → ○ Done   │ │
//! │ ┌─ Document Type ───────┐ │ │ ██████████░░░░░░░░ 50%          │ │
//! │ └───────────────────────┘ │ └─────────────────────────────────┘ │
//! │ ┌─ Document Content ────┐ │ ┌─ Coding Results ────────────────┐ │
//! │ │                       │ │ │ Diagnosis / Procedure codes     │ │
//! │ └───────────────────────┘ │ └─────────────────────────────────┘ │
//! │  Ready │ [Ctrl+S] Process [Ctrl+X] Cancel [F2-F4] Samples ...   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`App`] owns one [`WorkflowPoller`](crate::poller::WorkflowPoller) for
//! the session and drains its events on every frame.

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, AppEvent, FormField, View};
pub use event::{AppAction, EventHandler};

use crate::api::WorkflowApi;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use tracing::{error, info};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI application
pub async fn run(config: crate::config::Config, api: Arc<dyn WorkflowApi>) -> anyhow::Result<()> {
    info!("Starting TUI mode against {}", config.api.base_url);

    let mut terminal = init_terminal()?;

    let mut app = App::new(config, api);
    app.load_samples();

    let mut events = EventHandler::new(std::time::Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> anyhow::Result<()> {
    loop {
        // Update scroll bounds before drawing
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let viewport = ui::results_viewport_height(area);
        let results = ui::regions(area).results;
        let content_height = app
            .result
            .as_ref()
            .map(|r| widgets::result_lines(r, usize::from(results.width.saturating_sub(2))).len())
            .unwrap_or(0);
        app.update_scroll_bounds(u16::try_from(content_height).unwrap_or(u16::MAX), viewport);

        terminal.draw(|frame| ui::render(frame, app))?;

        // Drain poller and background events
        app.poll_events();

        // Ticks arrive every 100ms, so this never blocks for long
        let Some(action) = events.next().await else {
            break;
        };
        match action {
            AppAction::Quit => {
                if app.confirm_quit() {
                    break;
                }
            }
            AppAction::ForceQuit => {
                app.confirm_quit();
                break;
            }
            _ => app.handle_action(action),
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI exited normally");
    Ok(())
}
