//! Application State
//!
//! The view controller. Owns the document form and one [`WorkflowPoller`] for
//! the session, and keeps whatever the poller last reported so the UI can
//! draw it.

use crate::api::WorkflowApi;
use crate::coding::{CodingResult, NoticeKind};
use crate::config::Config;
use crate::models::{DocumentSubmission, DocumentType, SampleDocument};
use crate::poller::{EventSink, Phase, PollerEvent, WorkflowPoller};
use crate::tui::event::AppAction;
use crate::types::WorkflowError;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::{Modifier, Style};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

const TOAST_TTL_SECS: i64 = 5;
const MAX_TOASTS: usize = 4;
const SCROLL_PAGE: u16 = 10;

const NAME_PLACEHOLDER: &str = "Patient name (optional)";
const CONTENT_PLACEHOLDER: &str = "Paste or type the medical document here...";

/// Current view/screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Main,
    Help,
}

/// Focused form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    PatientName,
    DocumentType,
    Content,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::PatientName => FormField::DocumentType,
            FormField::DocumentType => FormField::Content,
            FormField::Content => FormField::PatientName,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::PatientName => FormField::Content,
            FormField::DocumentType => FormField::PatientName,
            FormField::Content => FormField::DocumentType,
        }
    }
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// Forwarded from the poller
    Poller(PollerEvent),
    SamplesLoaded(Vec<SampleDocument>),
    SamplesFailed(String),
    /// Submit refused before any job started (e.g. busy)
    SubmitRefused(WorkflowError),
}

/// Routes poller events into the app's channel.
struct AppSink(mpsc::UnboundedSender<AppEvent>);

impl EventSink for AppSink {
    fn emit(&self, event: PollerEvent) {
        if self.0.send(AppEvent::Poller(event)).is_err() {
            debug!("App event channel closed");
        }
    }
}

/// A transient notice in the corner of the screen
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: NoticeKind,
    pub created_at: DateTime<Utc>,
}

/// Main application state
pub struct App {
    pub config: Config,

    // UI State
    pub view: View,
    pub should_quit: bool,

    // Form
    pub focus: FormField,
    pub patient_name: TextArea<'static>,
    pub document_type: DocumentType,
    pub content: TextArea<'static>,

    // Job State
    pub phase: Phase,
    pub workflow_id: Option<String>,
    pub progress: f64,
    pub status_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub result: Option<CodingResult>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,

    pub toasts: Vec<Toast>,
    pub samples: Vec<SampleDocument>,
    pub scroll_offset: u16,
    pub max_scroll: u16,

    api: Arc<dyn WorkflowApi>,
    poller: WorkflowPoller,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, api: Arc<dyn WorkflowApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let poller = WorkflowPoller::new(
            api.clone(),
            Arc::new(AppSink(tx.clone())),
            config.polling.settings(),
        );

        let mut app = Self {
            config,
            view: View::Main,
            should_quit: false,
            focus: FormField::default(),
            patient_name: Self::name_field(),
            document_type: DocumentType::default(),
            content: Self::content_field(Vec::new()),
            phase: Phase::Idle,
            workflow_id: None,
            progress: 0.0,
            status_message: None,
            started_at: None,
            result: None,
            completed_at: None,
            error: None,
            toasts: Vec::new(),
            samples: Vec::new(),
            scroll_offset: 0,
            max_scroll: 0,
            api,
            poller,
            event_rx: rx,
            event_tx: tx,
        };

        app.update_field_styles();
        app
    }

    fn name_field() -> TextArea<'static> {
        let mut field = TextArea::default();
        field.set_cursor_line_style(Style::default());
        field.set_placeholder_text(NAME_PLACEHOLDER);
        field
    }

    fn content_field(lines: Vec<String>) -> TextArea<'static> {
        let mut field = TextArea::new(lines);
        field.set_cursor_line_style(Style::default());
        field.set_placeholder_text(CONTENT_PLACEHOLDER);
        field
    }

    /// Only the focused field shows a cursor.
    fn update_field_styles(&mut self) {
        let focused = Style::default().add_modifier(Modifier::REVERSED);
        let hidden = Style::default();

        self.patient_name.set_cursor_style(if self.focus == FormField::PatientName {
            focused
        } else {
            hidden
        });
        self.content.set_cursor_style(if self.focus == FormField::Content {
            focused
        } else {
            hidden
        });
    }

    /// Fetch the sample documents in the background
    pub fn load_samples(&self) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let event = match api.sample_documents().await {
                Ok(samples) => AppEvent::SamplesLoaded(samples),
                Err(e) => AppEvent::SamplesFailed(e.to_string()),
            };
            tx.send(event).ok();
        });
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Time since the current or last job was submitted
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some(end - started)
    }

    /// Stop the active job, if any, before exiting
    pub fn confirm_quit(&self) -> bool {
        if self.poller.is_busy() {
            info!("Quitting with a job in progress; cancelling it");
            self.poller.cancel();
        }
        true
    }

    /// Poll for async events
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Poller(event) => self.handle_poller_event(event),
            AppEvent::SamplesLoaded(samples) => {
                info!("Loaded {} sample documents", samples.len());
                self.samples = samples;
            }
            AppEvent::SamplesFailed(e) => {
                warn!("Failed to load sample documents: {}", e);
            }
            AppEvent::SubmitRefused(e) => {
                self.phase = self.poller.phase();
                self.push_toast(e.to_string(), NoticeKind::Warning);
            }
        }
    }

    fn handle_poller_event(&mut self, event: PollerEvent) {
        match event {
            PollerEvent::PhaseChanged(phase) => {
                self.phase = phase;
                if phase == Phase::Polling {
                    self.workflow_id = self.poller.snapshot().map(|job| job.workflow_id);
                    self.push_toast("Document processing started!", NoticeKind::Success);
                }
            }
            PollerEvent::Progress {
                workflow_id,
                progress,
                message,
            } => {
                self.workflow_id = Some(workflow_id);
                self.progress = progress;
                self.status_message = message;
            }
            PollerEvent::Completed {
                workflow_id,
                result,
            } => {
                let (notice, kind) = result.completion_notice();
                self.workflow_id = Some(workflow_id);
                self.progress = 100.0;
                self.completed_at = Some(Utc::now());
                self.result = Some(result);
                self.error = None;
                self.scroll_offset = 0;
                self.push_toast(notice, kind);
            }
            PollerEvent::Failed(e) => {
                self.completed_at = Some(Utc::now());
                self.result = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Handle a user action
    pub fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit | AppAction::ForceQuit => {
                self.should_quit = true;
            }
            AppAction::Submit => self.submit_document(),
            AppAction::CancelJob => self.cancel_job(),
            AppAction::ClearResults => self.clear_results(),
            AppAction::LoadSample(index) => self.load_sample(index),
            AppAction::ToggleHelp => {
                self.view = if self.view == View::Help {
                    View::Main
                } else {
                    View::Help
                };
            }
            AppAction::Escape => {
                self.view = View::Main;
            }
            AppAction::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            AppAction::ScrollDown => {
                if self.scroll_offset < self.max_scroll {
                    self.scroll_offset += 1;
                }
            }
            AppAction::ScrollPageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_PAGE);
            }
            AppAction::ScrollPageDown => {
                self.scroll_offset = (self.scroll_offset + SCROLL_PAGE).min(self.max_scroll);
            }
            AppAction::NextField => {
                self.focus = self.focus.next();
                self.update_field_styles();
            }
            AppAction::PrevField => {
                self.focus = self.focus.prev();
                self.update_field_styles();
            }
            AppAction::Input(key) => self.handle_input(key),
            AppAction::Tick => self.expire_toasts(Utc::now()),
        }
    }

    fn handle_input(&mut self, key: KeyEvent) {
        if self.view == View::Help {
            self.view = View::Main;
            return;
        }

        match self.focus {
            FormField::PatientName => {
                if key.code != KeyCode::Enter {
                    self.patient_name.input(key);
                }
            }
            FormField::DocumentType => match key.code {
                KeyCode::Left | KeyCode::Up => self.cycle_document_type(false),
                KeyCode::Right | KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ') => {
                    self.cycle_document_type(true)
                }
                _ => {}
            },
            FormField::Content => {
                self.content.input(key);
            }
        }
    }

    fn cycle_document_type(&mut self, forward: bool) {
        let all = DocumentType::ALL;
        let current = all
            .iter()
            .position(|t| *t == self.document_type)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % all.len()
        } else {
            (current + all.len() - 1) % all.len()
        };
        self.document_type = all[next];
    }

    /// The form contents as a submission
    pub fn submission(&self) -> DocumentSubmission {
        DocumentSubmission::new(
            self.patient_name.lines().join(" "),
            self.document_type,
            self.content.lines().join("\n"),
        )
    }

    fn submit_document(&mut self) {
        if self.is_busy() {
            self.push_toast(WorkflowError::Busy.to_string(), NoticeKind::Warning);
            return;
        }

        let submission = self.submission();
        // Claim the job here so a cancel issued before the task runs reaches it
        let token = match self.poller.begin(&submission) {
            Ok(token) => token,
            Err(WorkflowError::Busy) => {
                self.push_toast(WorkflowError::Busy.to_string(), NoticeKind::Warning);
                return;
            }
            Err(e) => {
                self.push_toast(e.to_string(), NoticeKind::Error);
                return;
            }
        };

        self.phase = Phase::Submitting;
        self.workflow_id = None;
        self.progress = 0.0;
        self.status_message = None;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        self.result = None;
        self.error = None;
        self.scroll_offset = 0;

        let poller = self.poller.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            match poller.send(token, submission).await {
                Ok(workflow_id) => debug!("Workflow {} accepted", workflow_id),
                Err(WorkflowError::Cancelled) => debug!("Submission overtaken by cancel"),
                // Terminal failures already reached the UI through the sink
                Err(e) if e.is_terminal() => debug!("Submission failed: {}", e),
                Err(e) => {
                    tx.send(AppEvent::SubmitRefused(e)).ok();
                }
            }
        });
    }

    fn cancel_job(&mut self) {
        if !self.is_busy() {
            self.push_toast("No document is being processed", NoticeKind::Info);
            return;
        }

        self.poller.cancel();

        // Nothing is emitted after cancel(); whatever is still queued is stale.
        while let Ok(event) = self.event_rx.try_recv() {
            if !matches!(event, AppEvent::Poller(_)) {
                self.handle_event(event);
            }
        }

        self.phase = Phase::Idle;
        self.workflow_id = None;
        self.progress = 0.0;
        self.status_message = None;
        self.started_at = None;
        self.completed_at = None;
        self.push_toast("Processing cancelled", NoticeKind::Info);
    }

    fn clear_results(&mut self) {
        if self.is_busy() {
            self.push_toast(
                "Cancel the current job (Ctrl+X) before clearing",
                NoticeKind::Warning,
            );
            return;
        }

        self.phase = Phase::Idle;
        self.workflow_id = None;
        self.progress = 0.0;
        self.status_message = None;
        self.started_at = None;
        self.completed_at = None;
        self.result = None;
        self.error = None;
        self.scroll_offset = 0;
        self.max_scroll = 0;

        self.patient_name = Self::name_field();
        self.content = Self::content_field(Vec::new());
        self.document_type = DocumentType::default();
        self.focus = FormField::default();
        self.update_field_styles();

        self.push_toast("Results cleared!", NoticeKind::Info);
    }

    fn load_sample(&mut self, index: usize) {
        let Some(sample) = self.samples.get(index).cloned() else {
            let message = if self.samples.is_empty() {
                "Sample documents are not loaded yet".to_string()
            } else {
                format!("Sample {} is not available", index + 1)
            };
            self.push_toast(message, NoticeKind::Warning);
            return;
        };

        self.patient_name = Self::name_field();
        self.patient_name.insert_str(sample.patient_name_hint());
        self.document_type = sample.parsed_type().unwrap_or_default();
        self.content = Self::content_field(sample.content.lines().map(String::from).collect());
        self.focus = FormField::Content;
        self.update_field_styles();

        info!("Loaded sample document {:?}", sample.name);
        self.push_toast("Sample document loaded successfully!", NoticeKind::Success);
    }

    pub fn push_toast(&mut self, message: impl Into<String>, kind: NoticeKind) {
        self.toasts.push(Toast {
            message: message.into(),
            kind,
            created_at: Utc::now(),
        });
        if self.toasts.len() > MAX_TOASTS {
            self.toasts.remove(0);
        }
    }

    /// Drop toasts older than the display window
    pub fn expire_toasts(&mut self, now: DateTime<Utc>) {
        let ttl = chrono::Duration::seconds(TOAST_TTL_SECS);
        self.toasts.retain(|toast| now - toast.created_at < ttl);
    }

    /// Update max scroll based on content
    pub fn update_scroll_bounds(&mut self, content_height: u16, viewport_height: u16) {
        self.max_scroll = content_height.saturating_sub(viewport_height);
        if self.scroll_offset > self.max_scroll {
            self.scroll_offset = self.max_scroll;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::{StatusResponse, SubmitResponse};
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use std::time::Duration;

    struct StubApi;

    #[async_trait]
    impl WorkflowApi for StubApi {
        async fn submit(&self, _document: &DocumentSubmission) -> Result<SubmitResponse, ApiError> {
            Ok(SubmitResponse {
                workflow_id: "w1".to_string(),
                document_id: None,
                status: None,
                message: None,
            })
        }

        async fn status(&self, _workflow_id: &str) -> Result<StatusResponse, ApiError> {
            Ok(StatusResponse {
                status: "completed".to_string(),
                progress: 100.0,
                message: None,
                result: Some(json!({
                    "diagnosis_codes": [{"code": "I21.9", "confidence": 0.95}],
                    "overall_confidence": 0.9
                })),
            })
        }

        async fn sample_documents(&self) -> Result<Vec<SampleDocument>, ApiError> {
            Ok(vec![SampleDocument {
                name: "Diabetes Management".to_string(),
                content: "Follow-up visit.\nHbA1c 7.2%.".to_string(),
                document_type: "follow_up".to_string(),
            }])
        }
    }

    fn app() -> App {
        App::new(Config::default(), Arc::new(StubApi))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(AppAction::Input(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )));
        }
    }

    #[tokio::test]
    async fn test_blank_content_shows_error_toast() {
        let mut app = app();
        app.handle_action(AppAction::Submit);

        assert_eq!(app.phase, Phase::Idle);
        let toast = app.toasts.last().unwrap();
        assert_eq!(toast.kind, NoticeKind::Error);
        assert_eq!(toast.message, "Please enter document content");
    }

    #[tokio::test]
    async fn test_form_fields_and_type_cycling() {
        let mut app = app();
        type_text(&mut app, "Jane");
        app.handle_action(AppAction::NextField);
        app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE)));
        app.handle_action(AppAction::NextField);
        type_text(&mut app, "chest pain");

        let submission = app.submission();
        assert_eq!(submission.patient_name, "Jane");
        assert_eq!(submission.document_type, DocumentType::DischargeSummary);
        assert_eq!(submission.content, "chest pain");

        app.handle_action(AppAction::PrevField);
        app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)));
        app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)));
        assert_eq!(app.document_type, DocumentType::InpatientAdmission);
    }

    #[tokio::test]
    async fn test_load_sample_prefills_form() {
        let mut app = app();
        app.load_samples();
        tokio::task::yield_now().await;
        for _ in 0..10 {
            app.poll_events();
            if !app.samples.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        app.handle_action(AppAction::LoadSample(0));
        let submission = app.submission();
        assert_eq!(submission.patient_name, "Diabetes Management");
        assert_eq!(submission.document_type, DocumentType::FollowUp);
        assert_eq!(submission.content, "Follow-up visit.\nHbA1c 7.2%.");
        assert_eq!(app.toasts.last().unwrap().kind, NoticeKind::Success);

        app.handle_action(AppAction::LoadSample(2));
        assert_eq!(app.toasts.last().unwrap().message, "Sample 3 is not available");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_runs_job_to_completion() {
        let mut app = app();
        app.focus = FormField::Content;
        type_text(&mut app, "chest pain");

        app.handle_action(AppAction::Submit);
        assert_eq!(app.phase, Phase::Submitting);
        assert!(app.is_busy());

        tokio::time::sleep(Duration::from_secs(3)).await;
        app.poll_events();

        assert_eq!(app.phase, Phase::Completed);
        assert_eq!(app.workflow_id.as_deref(), Some("w1"));
        assert_eq!(app.result.as_ref().map(|r| r.total_codes()), Some(1));
        assert_eq!(app.progress, 100.0);
        assert!(app.error.is_none());
        assert_eq!(
            app.toasts.last().unwrap().message,
            "Successfully processed document with 1 codes generated!"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_queued_events() {
        let mut app = app();
        app.focus = FormField::Content;
        type_text(&mut app, "chest pain");
        app.handle_action(AppAction::Submit);

        // Let the submit land but not the first poll
        tokio::time::sleep(Duration::from_millis(500)).await;
        app.handle_action(AppAction::CancelJob);

        tokio::time::sleep(Duration::from_secs(10)).await;
        app.poll_events();

        assert_eq!(app.phase, Phase::Idle);
        assert!(app.result.is_none());
        assert!(app.workflow_id.is_none());
        assert!(!app.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_submission_task_runs() {
        let mut app = app();
        app.focus = FormField::Content;
        type_text(&mut app, "chest pain");
        app.handle_action(AppAction::Submit);
        assert_eq!(app.poller.phase(), Phase::Submitting);

        // The spawned submission has not been polled yet
        app.handle_action(AppAction::CancelJob);

        tokio::time::sleep(Duration::from_secs(10)).await;
        app.poll_events();

        assert_eq!(app.phase, Phase::Idle);
        assert_eq!(app.poller.phase(), Phase::Idle);
        assert!(app.poller.snapshot().is_none());
        assert!(app.workflow_id.is_none());
        assert!(app.result.is_none());
    }

    #[tokio::test]
    async fn test_failure_sets_error_panel() {
        let mut app = app();
        app.handle_event(AppEvent::Poller(PollerEvent::PhaseChanged(Phase::TimedOut)));
        app.handle_event(AppEvent::Poller(PollerEvent::Failed(WorkflowError::Timeout)));

        assert_eq!(app.phase, Phase::TimedOut);
        assert_eq!(app.error.as_deref(), Some("Processing timed out. Please try again."));
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_clear_refused_while_busy() {
        let mut app = app();
        app.phase = Phase::Polling;
        app.handle_action(AppAction::ClearResults);
        assert_eq!(app.toasts.last().unwrap().kind, NoticeKind::Warning);
        assert_eq!(app.phase, Phase::Polling);

        app.phase = Phase::Failed;
        app.error = Some("boom".to_string());
        app.handle_action(AppAction::ClearResults);
        assert_eq!(app.phase, Phase::Idle);
        assert!(app.error.is_none());
    }

    #[tokio::test]
    async fn test_toasts_expire() {
        let mut app = app();
        app.push_toast("hello", NoticeKind::Info);

        app.expire_toasts(Utc::now());
        assert_eq!(app.toasts.len(), 1);

        app.expire_toasts(Utc::now() + chrono::Duration::seconds(TOAST_TTL_SECS + 1));
        assert!(app.toasts.is_empty());
    }
}
