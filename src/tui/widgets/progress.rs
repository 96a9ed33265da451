//! Progress Widget
//!
//! Displays where the current job is: stage line, gauge and latest message.

use crate::poller::Phase;
use crate::tui::app::App;
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Render the progress indicator
pub fn render_progress(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Processing ")
        .borders(Borders::ALL)
        .border_style(if app.is_busy() {
            Theme::border_focused()
        } else {
            Theme::border()
        });

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Stages
            Constraint::Length(1), // Gauge
            Constraint::Min(0),    // Message
        ])
        .split(inner);

    let mut stage_spans = build_progress_line(app.phase, app.workflow_id.is_some());
    if let Some(elapsed) = app.elapsed() {
        stage_spans.push(Span::styled(
            format!("   {}s", elapsed.num_seconds()),
            Theme::text_dim(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(stage_spans)), rows[0]);

    let ratio = (app.progress / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Theme::gauge())
        .ratio(ratio)
        .label(format!("{:.0}%", app.progress.clamp(0.0, 100.0)));
    frame.render_widget(gauge, rows[1]);

    let message = match (&app.status_message, app.phase) {
        (Some(message), _) => Span::styled(
            truncate_string(message, rows[2].width as usize),
            Theme::text_secondary(),
        ),
        (None, Phase::Idle) => Span::styled("Waiting for a document...", Theme::text_dim()),
        (None, phase) => Span::styled(phase.label(), Theme::text_secondary()),
    };
    frame.render_widget(Paragraph::new(Line::from(message)), rows[2]);
}

/// Build the progress line with stage indicators
fn build_progress_line(phase: Phase, accepted: bool) -> Vec<Span<'static>> {
    let states = stage_states(phase, accepted);
    let stages = ["Submit", "Process", "Done"];

    let mut spans = Vec::new();

    for (i, (name, state)) in stages.iter().zip(states).enumerate() {
        let (icon, style) = match state {
            StageState::Complete => (Icons::COMPLETE, Theme::complete()),
            StageState::Active => (Icons::ACTIVE, Theme::active()),
            StageState::Pending => (Icons::PENDING, Theme::pending()),
            StageState::Error => (Icons::ERROR, Theme::error()),
        };

        spans.push(Span::styled(format!("{} ", icon), style));
        spans.push(Span::styled(name.to_string(), style));

        if i < stages.len() - 1 {
            spans.push(Span::styled(format!(" {} ", Icons::ARROW), Theme::text_dim()));
        }
    }

    spans
}

/// State of a job stage
#[derive(Debug, Clone, Copy, PartialEq)]
enum StageState {
    Pending,
    Active,
    Complete,
    Error,
}

/// `accepted` tells a rejected submission apart from a job that failed later.
fn stage_states(phase: Phase, accepted: bool) -> [StageState; 3] {
    use StageState::*;

    match phase {
        Phase::Idle => [Pending, Pending, Pending],
        Phase::Submitting => [Active, Pending, Pending],
        Phase::Polling => [Complete, Active, Pending],
        Phase::Completed => [Complete, Complete, Complete],
        Phase::Failed | Phase::TimedOut if accepted => [Complete, Error, Pending],
        Phase::Failed | Phase::TimedOut => [Error, Pending, Pending],
    }
}

/// Truncate a string to fit within a given width
pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width > 3 {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max_width).collect()
    }
}
