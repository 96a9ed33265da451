//! UI Rendering
//!
//! Main UI layout and rendering logic for the TUI.

use crate::tui::app::{App, FormField, View};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Screen regions
pub struct Regions {
    pub header: Rect,
    pub name: Rect,
    pub document_type: Rect,
    pub content: Rect,
    pub progress: Rect,
    pub results: Rect,
    pub status: Rect,
}

/// Split the screen into its regions
pub fn regions(area: Rect) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Patient name
            Constraint::Length(3), // Document type
            Constraint::Min(3),    // Content
        ])
        .split(columns[0]);

    let output = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Progress
            Constraint::Min(3),    // Results
        ])
        .split(columns[1]);

    Regions {
        header: rows[0],
        name: form[0],
        document_type: form[1],
        content: form[2],
        progress: output[0],
        results: output[1],
        status: rows[2],
    }
}

/// Visible rows inside the results panel
pub fn results_viewport_height(area: Rect) -> u16 {
    regions(area).results.height.saturating_sub(2)
}

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let regions = regions(frame.area());

    render_header(frame, regions.header, app);
    render_form(frame, &regions, app);
    widgets::render_progress(frame, regions.progress, app);
    widgets::render_results(frame, regions.results, app);
    render_status_bar(frame, regions.status, app);

    widgets::render_toasts(frame, frame.area(), &app.toasts);

    if app.view == View::Help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title_text = vec![Line::from(vec![
        Span::raw("🩺 "),
        Span::styled("Medical Coding", Theme::title()),
        Span::styled(" ICD-10 Workflow Client", Theme::text_secondary()),
        Span::raw("  "),
        Span::styled(app.config.api.base_url.clone(), Theme::text_dim()),
    ])];

    let title = Paragraph::new(title_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    frame.render_widget(title, area);
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
}

fn render_form(frame: &mut Frame, regions: &Regions, app: &App) {
    let focused = |field: FormField| app.view == View::Main && app.focus == field;

    let block = field_block(" Patient Name ", focused(FormField::PatientName));
    let inner = block.inner(regions.name);
    frame.render_widget(block, regions.name);
    frame.render_widget(&app.patient_name, inner);

    let type_line = Line::from(vec![
        Span::styled("◀ ", Theme::text_dim()),
        Span::styled(app.document_type.label(), Theme::selected()),
        Span::styled(" ▶", Theme::text_dim()),
    ]);
    let type_widget = Paragraph::new(type_line).block(field_block(
        " Document Type ",
        focused(FormField::DocumentType),
    ));
    frame.render_widget(type_widget, regions.document_type);

    let title = if app.is_busy() {
        " Document Content (processing...) "
    } else {
        " Document Content "
    };
    let block = field_block(title, focused(FormField::Content));
    let inner = block.inner(regions.content);
    frame.render_widget(block, regions.content);
    frame.render_widget(&app.content, inner);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status = match (&app.error, app.phase) {
        (Some(_), phase) => Span::styled(phase.label(), Theme::error()),
        (None, phase) if phase.is_busy() => Span::styled(phase.label(), Theme::active()),
        (None, phase) if phase.is_terminal() => Span::styled(phase.label(), Theme::complete()),
        (None, phase) => Span::styled(phase.label(), Theme::text_secondary()),
    };

    let submit_style = if app.is_busy() {
        Theme::pending()
    } else {
        Theme::shortcut_key()
    };

    let shortcuts = vec![
        Span::styled(" [Ctrl+S]", submit_style),
        Span::styled(" Process ", Theme::shortcut_desc()),
        Span::styled("[Ctrl+X]", Theme::shortcut_key()),
        Span::styled(" Cancel ", Theme::shortcut_desc()),
        Span::styled("[F2-F4]", Theme::shortcut_key()),
        Span::styled(" Samples ", Theme::shortcut_desc()),
        Span::styled("[Ctrl+Q]", Theme::shortcut_key()),
        Span::styled(" Quit ", Theme::shortcut_desc()),
        Span::styled("[F1]", Theme::shortcut_key()),
        Span::styled(" Help", Theme::shortcut_desc()),
    ];

    let line = Line::from(
        std::iter::once(status)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(line), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let shortcuts = [
        ("Ctrl+S / F5  ", "Process document"),
        ("Ctrl+X       ", "Cancel the running job"),
        ("Ctrl+L       ", "Clear results and form"),
        ("F2 / F3 / F4 ", "Load sample document 1-3"),
        ("Tab          ", "Next field"),
        ("Shift+Tab    ", "Previous field"),
        ("←/→          ", "Change document type"),
        ("PageUp/Down  ", "Scroll results"),
        ("Ctrl+↑/↓     ", "Scroll results by line"),
        ("Ctrl+Q       ", "Quit application"),
        ("Ctrl+C       ", "Force quit"),
        ("F1           ", "Show this help"),
    ];

    let mut help_lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
    ];
    help_lines.extend(shortcuts.iter().map(|(key, desc)| {
        Line::from(vec![
            Span::styled(*key, Theme::shortcut_key()),
            Span::styled(*desc, Theme::text()),
        ])
    }));
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        format!("{} Press any key to close", Icons::SELECTED),
        Theme::placeholder(),
    )));

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
    use crate::api::{ApiError, WorkflowApi};
    use crate::coding::CodingResult;
    use crate::config::Config;
    use crate::models::{DocumentSubmission, SampleDocument, StatusResponse, SubmitResponse};
    use crate::poller::Phase;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct OfflineApi;

    #[async_trait]
    impl WorkflowApi for OfflineApi {
        async fn submit(&self, _document: &DocumentSubmission) -> Result<SubmitResponse, ApiError> {
            Err(ApiError::Decode("offline".to_string()))
        }

        async fn status(&self, workflow_id: &str) -> Result<StatusResponse, ApiError> {
            Err(ApiError::NotFound(workflow_id.to_string()))
        }

        async fn sample_documents(&self) -> Result<Vec<SampleDocument>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for row in buffer.content().chunks(buffer.area.width as usize) {
            for cell in row {
                text.push_str(cell.symbol());
            }
            text.push('\n');
        }
        text
    }

    #[tokio::test]
    async fn test_renders_results_and_status() {
        let mut app = App::new(Config::default(), Arc::new(OfflineApi));
        app.phase = Phase::Completed;
        app.progress = 100.0;
        app.result = Some(
            CodingResult::from_value(serde_json::json!({
                "diagnosis_codes": [{"code": "I21.9", "confidence": 0.95}],
                "overall_confidence": 0.9
            }))
            .unwrap(),
        );

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("Coding Results"));
        assert!(text.contains("I21.9"));
        assert!(text.contains("100%"));
        assert!(text.contains("Complete"));
    }

    #[tokio::test]
    async fn test_renders_error_panel() {
        let mut app = App::new(Config::default(), Arc::new(OfflineApi));
        app.phase = Phase::Failed;
        app.error = Some("Workflow not found. Please try again.".to_string());

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("Processing Error"));
        assert!(text.contains("Workflow not found"));
        assert!(!text.contains("Keyboard Shortcuts"));

        app.view = View::Help;
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen_text(&terminal).contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_results_viewport_height() {
        let height = results_viewport_height(Rect::new(0, 0, 120, 40));
        // 40 rows - header 3 - status 1 - progress 5 - borders 2
        assert_eq!(height, 29);
    }
}
