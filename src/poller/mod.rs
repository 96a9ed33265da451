//! Workflow Poller
//!
//! Owns the lifecycle of one remote coding job: submit, poll, terminate.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Polling ──completed──▶ Completed
//!                      │                 │ ├──error/404/empty──▶ Failed
//!                      └──rejected──▶ Failed └──deadline──▶ TimedOut
//! ```
//!
//! Entering `Polling` starts two timer tasks: a recurring status check and a
//! one-shot deadline. Both capture the [`JobToken`] of the submission that
//! started them and do nothing once that token is no longer the active one,
//! so a late tick can never act on a job that was cancelled or replaced. Any
//! terminal transition, and `cancel()`, aborts both.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Events are emitted with the lock held, which is what makes
//! "no events after cancel" hold.

mod events;

pub use events::{EventSink, PollerEvent};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, WorkflowApi};
use crate::coding::CodingResult;
use crate::models::{DocumentSubmission, StatusResponse, WorkflowStatus};
use crate::types::WorkflowError;

const GENERIC_SUBMIT_FAILURE: &str = "Failed to start processing";
const GENERIC_WORKFLOW_FAILURE: &str = "An error occurred during processing";

/// Timing knobs for one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Lifecycle state of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
}

impl Phase {
    /// Submission is disabled while busy.
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Submitting | Phase::Polling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::TimedOut)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Ready",
            Phase::Submitting => "Submitting document...",
            Phase::Polling => "Processing...",
            Phase::Completed => "Complete",
            Phase::Failed => "Failed",
            Phase::TimedOut => "Timed out",
        }
    }
}

/// Identifies one submission. Generations only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobToken(u64);

/// The job being tracked, or the last one that finished.
#[derive(Debug, Clone)]
pub struct Job {
    pub token: JobToken,
    pub workflow_id: String,
    pub phase: Phase,
    pub progress: f64,
    pub message: Option<String>,
    pub result: Option<CodingResult>,
    pub started_at: Instant,
}

impl Job {
    fn new(token: JobToken, workflow_id: String) -> Self {
        Self {
            token,
            workflow_id,
            phase: Phase::Polling,
            progress: 0.0,
            message: None,
            result: None,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Default)]
struct PollerState {
    phase: Phase,
    generation: u64,
    active: Option<JobToken>,
    job: Option<Job>,
    poll_timer: Option<JoinHandle<()>>,
    deadline_timer: Option<JoinHandle<()>>,
}

impl PollerState {
    fn is_current(&self, token: JobToken) -> bool {
        self.active == Some(token)
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.poll_timer.take() {
            handle.abort();
        }
        if let Some(handle) = self.deadline_timer.take() {
            handle.abort();
        }
    }
}

struct Inner {
    api: Arc<dyn WorkflowApi>,
    sink: Arc<dyn EventSink>,
    settings: PollerSettings,
    state: Mutex<PollerState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, state: &mut PollerState, phase: Phase) {
        debug!("Poller phase {:?} -> {:?}", state.phase, phase);
        state.phase = phase;
        if let Some(job) = state.job.as_mut() {
            job.phase = phase;
        }
        self.sink.emit(PollerEvent::PhaseChanged(phase));
    }

    /// Terminal transition: stop both timers, clear the active token, report.
    fn finish(&self, state: &mut PollerState, phase: Phase, failure: Option<WorkflowError>) {
        state.cancel_timers();
        state.active = None;
        self.transition(state, phase);
        if let Some(err) = failure {
            self.sink.emit(PollerEvent::Failed(err));
        }
    }

    /// Apply one status check. Returns whether polling should continue.
    fn apply_status(
        &self,
        token: JobToken,
        outcome: Result<StatusResponse, ApiError>,
    ) -> bool {
        let mut state = self.state();
        if !state.is_current(token) || state.phase != Phase::Polling {
            debug!("Discarding status response for a stale job");
            return false;
        }

        let status = match outcome {
            Ok(status) => status,
            Err(e) if e.is_not_found() => {
                warn!("Workflow not found, stopping checks: {}", e);
                self.finish(&mut state, Phase::Failed, Some(WorkflowError::NotFound));
                return false;
            }
            Err(e) => {
                warn!("{}; retrying on next tick", WorkflowError::Transport(e.to_string()));
                return true;
            }
        };

        match status.workflow_status() {
            WorkflowStatus::Processing => {
                let Some(job) = state.job.as_mut() else {
                    return false;
                };
                job.progress = status.progress;
                job.message = status.message.clone();
                debug!("Workflow {} at {}%", job.workflow_id, status.progress);
                let event = PollerEvent::Progress {
                    workflow_id: job.workflow_id.clone(),
                    progress: status.progress,
                    message: status.message,
                };
                self.sink.emit(event);
                true
            }
            WorkflowStatus::Completed => {
                let payload = status.result.filter(|v| !v.is_null());
                let Some(payload) = payload else {
                    warn!("Workflow completed without a result");
                    self.finish(&mut state, Phase::Failed, Some(WorkflowError::EmptyResult));
                    return false;
                };

                match CodingResult::from_value(payload) {
                    Ok(result) => {
                        let workflow_id = match state.job.as_mut() {
                            Some(job) => {
                                job.progress = status.progress;
                                job.message = status.message;
                                job.result = Some(result.clone());
                                job.workflow_id.clone()
                            }
                            None => String::new(),
                        };
                        info!(
                            "Workflow {} completed with {} codes",
                            workflow_id,
                            result.total_codes()
                        );
                        self.finish(&mut state, Phase::Completed, None);
                        self.sink.emit(PollerEvent::Completed { workflow_id, result });
                    }
                    Err(e) => {
                        error!("Workflow result could not be read: {}", e);
                        self.finish(
                            &mut state,
                            Phase::Failed,
                            Some(WorkflowError::MalformedResult(e.to_string())),
                        );
                    }
                }
                false
            }
            WorkflowStatus::Error => {
                let message = status
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_WORKFLOW_FAILURE.to_string());
                error!("Workflow reported an error: {}", message);
                if let Some(job) = state.job.as_mut() {
                    job.message = Some(message.clone());
                }
                self.finish(
                    &mut state,
                    Phase::Failed,
                    Some(WorkflowError::WorkflowReported(message)),
                );
                false
            }
            WorkflowStatus::Other(other) => {
                warn!("Unknown workflow status {:?}, continuing to poll", other);
                true
            }
        }
    }

    fn expire(&self, token: JobToken) {
        let mut state = self.state();
        if !state.is_current(token) || state.phase != Phase::Polling {
            return;
        }
        warn!("Status checks timed out after {:?}", self.settings.timeout);
        self.finish(&mut state, Phase::TimedOut, Some(WorkflowError::Timeout));
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state().cancel_timers();
    }
}

/// Submits documents and tracks the resulting workflow until it ends.
///
/// Cloning is cheap and every clone drives the same job.
#[derive(Clone)]
pub struct WorkflowPoller {
    inner: Arc<Inner>,
}

impl WorkflowPoller {
    pub fn new(api: Arc<dyn WorkflowApi>, sink: Arc<dyn EventSink>, settings: PollerSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                sink,
                settings,
                state: Mutex::new(PollerState::default()),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.state().phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase().is_busy()
    }

    /// The active job, or the last one if it has finished.
    pub fn snapshot(&self) -> Option<Job> {
        self.inner.state().job.clone()
    }

    /// Send a document and start polling for its result.
    ///
    /// Returns the workflow id once the service has accepted the document.
    /// Everything after that is reported through the event sink.
    pub async fn submit(&self, document: DocumentSubmission) -> Result<String, WorkflowError> {
        let token = self.begin(&document)?;
        self.send(token, document).await
    }

    /// Claim the poller for a new job and move to `Submitting` without any I/O.
    ///
    /// Callers that hand the network half to a spawned task use this so the
    /// job exists, and can be cancelled, before the task first runs.
    pub fn begin(&self, document: &DocumentSubmission) -> Result<JobToken, WorkflowError> {
        document.validate()?;

        let mut state = self.inner.state();
        if state.phase.is_busy() {
            warn!("Submission rejected: a job is already in progress");
            return Err(WorkflowError::Busy);
        }
        state.cancel_timers();
        state.generation += 1;
        let token = JobToken(state.generation);
        state.active = Some(token);
        state.job = None;
        self.inner.transition(&mut state, Phase::Submitting);
        Ok(token)
    }

    /// Submit the document for a job claimed by [`WorkflowPoller::begin`].
    pub async fn send(
        &self,
        token: JobToken,
        document: DocumentSubmission,
    ) -> Result<String, WorkflowError> {
        if !self.inner.state().is_current(token) {
            debug!("Job {:?} cancelled before it was sent", token);
            return Err(WorkflowError::Cancelled);
        }

        info!(
            "Submitting {} document for patient {}",
            document.document_type, document.patient_name
        );
        let outcome = self.inner.api.submit(&document).await;

        let mut state = self.inner.state();
        if !state.is_current(token) {
            debug!("Submission finished after cancel; discarding");
            return Err(WorkflowError::Cancelled);
        }

        match outcome {
            Ok(response) => {
                info!("Workflow {} started", response.workflow_id);
                state.job = Some(Job::new(token, response.workflow_id.clone()));
                self.inner.transition(&mut state, Phase::Polling);
                self.arm_timers(&mut state, token, response.workflow_id.clone());
                Ok(response.workflow_id)
            }
            Err(e) => {
                error!("Failed to start workflow: {}", e);
                let message = e
                    .server_message()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(GENERIC_SUBMIT_FAILURE)
                    .to_string();
                let err = WorkflowError::SubmissionRejected(message);
                self.inner.finish(&mut state, Phase::Failed, Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Stop tracking the current job and go back to `Idle`. Emits nothing.
    pub fn cancel(&self) {
        let mut state = self.inner.state();
        state.cancel_timers();
        if let Some(token) = state.active.take() {
            info!("Cancelled job {:?}", token);
        }
        state.job = None;
        state.phase = Phase::Idle;
    }

    fn arm_timers(&self, state: &mut PollerState, token: JobToken, workflow_id: String) {
        let settings = self.inner.settings;

        state.poll_timer = Some(tokio::spawn(run_status_checks(
            Arc::downgrade(&self.inner),
            token,
            workflow_id,
            settings.poll_interval,
        )));
        state.deadline_timer = Some(tokio::spawn(run_deadline(
            Arc::downgrade(&self.inner),
            token,
            settings.timeout,
        )));
    }
}

async fn run_status_checks(inner: Weak<Inner>, token: JobToken, workflow_id: String, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            return;
        };
        if !inner.state().is_current(token) {
            return;
        }

        debug!("Checking status of workflow {}", workflow_id);
        let outcome = inner.api.status(&workflow_id).await;
        if !inner.apply_status(token, outcome) {
            return;
        }
    }
}

async fn run_deadline(inner: Weak<Inner>, token: JobToken, timeout: Duration) {
    time::sleep(timeout).await;
    if let Some(inner) = inner.upgrade() {
        inner.expire(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, SampleDocument, SubmitResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct ScriptedApi {
        submit_outcome: Mutex<Option<Result<SubmitResponse, ApiError>>>,
        submit_delay: Option<Duration>,
        statuses: Mutex<VecDeque<Result<StatusResponse, ApiError>>>,
        submit_calls: AtomicUsize,
        status_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn with_statuses(statuses: Vec<Result<StatusResponse, ApiError>>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                ..Default::default()
            }
        }

        fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WorkflowApi for ScriptedApi {
        async fn submit(&self, _document: &DocumentSubmission) -> Result<SubmitResponse, ApiError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.submit_delay {
                time::sleep(delay).await;
            }
            self.submit_outcome.lock().unwrap().take().unwrap_or_else(|| {
                Ok(SubmitResponse {
                    workflow_id: "w1".to_string(),
                    document_id: None,
                    status: Some("processing".to_string()),
                    message: None,
                })
            })
        }

        async fn status(&self, _workflow_id: &str) -> Result<StatusResponse, ApiError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(StatusResponse::processing(0.0, "Waiting")))
        }

        async fn sample_documents(&self) -> Result<Vec<SampleDocument>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn poller_with(api: Arc<ScriptedApi>) -> (WorkflowPoller, mpsc::UnboundedReceiver<PollerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = WorkflowPoller::new(api, Arc::new(tx), PollerSettings::default());
        (poller, rx)
    }

    fn chest_pain() -> DocumentSubmission {
        DocumentSubmission::new("Unknown", DocumentType::Consultation, "chest pain")
    }

    fn completed(result: serde_json::Value) -> StatusResponse {
        StatusResponse {
            status: "completed".to_string(),
            progress: 100.0,
            message: Some("Processing completed successfully".to_string()),
            result: Some(result),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PollerEvent>) -> Vec<PollerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<PollerEvent>) -> PollerEvent {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if event.is_outcome() {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_chest_pain_example_completes() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![
            Ok(StatusResponse::processing(50.0, "Generating ICD-10 codes with AI...")),
            Ok(completed(json!({
                "diagnosis_codes": [{"code": "I21.9", "confidence": 0.95}],
                "overall_confidence": 0.9
            }))),
        ]));
        let (poller, mut rx) = poller_with(api.clone());

        let workflow_id = poller.submit(chest_pain()).await.unwrap();
        assert_eq!(workflow_id, "w1");
        assert_eq!(poller.phase(), Phase::Polling);

        let outcome = next_outcome(&mut rx).await;
        let PollerEvent::Completed { workflow_id, result } = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(workflow_id, "w1");
        assert_eq!(result.total_codes(), 1);
        assert_eq!(result.overall_confidence(), 0.9);
        assert_eq!(poller.phase(), Phase::Completed);

        let job = poller.snapshot().unwrap();
        assert_eq!(job.phase, Phase::Completed);
        assert_eq!(job.result.map(|r| r.total_codes()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_sequence_for_successful_job() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![
            Ok(StatusResponse::processing(50.0, "Generating ICD-10 codes with AI...")),
            Ok(completed(json!({"diagnosis_codes": [{"code": "I21.9"}]}))),
        ]));
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();

        let mut events = Vec::new();
        loop {
            let event = rx.recv().await.unwrap();
            let done = event.is_outcome();
            events.push(event);
            if done {
                break;
            }
        }

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], PollerEvent::PhaseChanged(Phase::Submitting));
        assert_eq!(events[1], PollerEvent::PhaseChanged(Phase::Polling));
        assert_eq!(
            events[2],
            PollerEvent::Progress {
                workflow_id: "w1".to_string(),
                progress: 50.0,
                message: Some("Generating ICD-10 codes with AI...".to_string()),
            }
        );
        assert_eq!(events[3], PollerEvent::PhaseChanged(Phase::Completed));
        assert!(matches!(events[4], PollerEvent::Completed { .. }));
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_cancels_deadline() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![Ok(completed(json!({
            "diagnosis_codes": [{"code": "I21.9", "confidence": 0.95}]
        })))]));
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();
        assert!(matches!(next_outcome(&mut rx).await, PollerEvent::Completed { .. }));

        time::sleep(Duration::from_secs(10 * 60)).await;

        assert!(drain(&mut rx).is_empty(), "no timeout may fire after completion");
        assert_eq!(api.status_calls(), 1);
        assert_eq!(poller.phase(), Phase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_polling_is_rejected() {
        let api = Arc::new(ScriptedApi::default());
        let (poller, _rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();
        assert!(poller.is_busy());

        let second = poller.submit(chest_pain()).await;
        assert_eq!(second, Err(WorkflowError::Busy));
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.snapshot().unwrap().workflow_id, "w1");

        poller.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_forwards_progress_unchanged() {
        let values = [5.0, 12.5, 12.5, 47.0, 90.0];
        let api = Arc::new(ScriptedApi::with_statuses(
            values
                .iter()
                .map(|p| Ok(StatusResponse::processing(*p, format!("at {}", p))))
                .collect(),
        ));
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();

        let mut seen = Vec::new();
        while seen.len() < values.len() {
            match rx.recv().await.unwrap() {
                PollerEvent::Progress { progress, message, .. } => {
                    assert_eq!(message, Some(format!("at {}", progress)));
                    seen.push(progress);
                }
                PollerEvent::PhaseChanged(_) => {}
                other => panic!("unexpected event {:?}", other),
            }
            assert_eq!(poller.phase(), Phase::Polling);
        }

        assert_eq!(seen, values);
        assert_eq!(poller.snapshot().unwrap().progress, 90.0);
        poller.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_exactly_once() {
        let api = Arc::new(ScriptedApi::default());
        let (poller, mut rx) = poller_with(api.clone());
        let started = Instant::now();

        poller.submit(chest_pain()).await.unwrap();

        let outcome = next_outcome(&mut rx).await;
        assert_eq!(outcome, PollerEvent::Failed(WorkflowError::Timeout));
        assert!(started.elapsed() >= Duration::from_secs(300));
        assert_eq!(poller.phase(), Phase::TimedOut);

        let calls_at_timeout = api.status_calls();
        time::sleep(Duration::from_secs(10 * 60)).await;

        let late: Vec<_> = drain(&mut rx).into_iter().filter(|e| e.is_outcome()).collect();
        assert!(late.is_empty(), "timeout reported more than once: {:?}", late);
        assert_eq!(api.status_calls(), calls_at_timeout, "polling continued after timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_fails_immediately() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![Err(ApiError::NotFound(
            "w1".to_string(),
        ))]));
        let (poller, mut rx) = poller_with(api.clone());
        let started = Instant::now();

        poller.submit(chest_pain()).await.unwrap();

        let outcome = next_outcome(&mut rx).await;
        assert_eq!(outcome, PollerEvent::Failed(WorkflowError::NotFound));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(poller.phase(), Phase::Failed);

        time::sleep(Duration::from_secs(10 * 60)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(api.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_keep_polling() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![
            Err(ApiError::Status { status: 502, message: "Bad Gateway".to_string() }),
            Err(ApiError::Decode("expected value".to_string())),
            Ok(StatusResponse::processing(40.0, "Validating codes and generating report...")),
        ]));
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();

        loop {
            match rx.recv().await.unwrap() {
                PollerEvent::Progress { progress, .. } => {
                    assert_eq!(progress, 40.0);
                    break;
                }
                PollerEvent::PhaseChanged(_) => {}
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(poller.phase(), Phase::Polling);
        assert_eq!(api.status_calls(), 3);
        poller.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_result_is_empty_result() {
        for result in [None, Some(serde_json::Value::Null)] {
            let api = Arc::new(ScriptedApi::with_statuses(vec![Ok(StatusResponse {
                status: "completed".to_string(),
                progress: 100.0,
                message: None,
                result,
            })]));
            let (poller, mut rx) = poller_with(api);

            poller.submit(chest_pain()).await.unwrap();

            assert_eq!(
                next_outcome(&mut rx).await,
                PollerEvent::Failed(WorkflowError::EmptyResult)
            );
            assert_eq!(poller.phase(), Phase::Failed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_result_fails() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![Ok(completed(json!({
            "diagnosis_codes": "I21.9"
        })))]));
        let (poller, mut rx) = poller_with(api);

        poller.submit(chest_pain()).await.unwrap();

        assert!(matches!(
            next_outcome(&mut rx).await,
            PollerEvent::Failed(WorkflowError::MalformedResult(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_reports_server_message() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![Ok(StatusResponse {
            status: "error".to_string(),
            progress: 20.0,
            message: Some("Workflow execution failed: throttled".to_string()),
            result: None,
        })]));
        let (poller, mut rx) = poller_with(api);

        poller.submit(chest_pain()).await.unwrap();

        assert_eq!(
            next_outcome(&mut rx).await,
            PollerEvent::Failed(WorkflowError::WorkflowReported(
                "Workflow execution failed: throttled".to_string()
            ))
        );
        assert_eq!(poller.phase(), Phase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_without_message_uses_generic_text() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![Ok(StatusResponse {
            status: "error".to_string(),
            ..Default::default()
        })]));
        let (poller, mut rx) = poller_with(api);

        poller.submit(chest_pain()).await.unwrap();

        assert_eq!(
            next_outcome(&mut rx).await,
            PollerEvent::Failed(WorkflowError::WorkflowReported(
                GENERIC_WORKFLOW_FAILURE.to_string()
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![
            Ok(StatusResponse { status: "queued".to_string(), ..Default::default() }),
            Ok(StatusResponse { status: "".to_string(), ..Default::default() }),
            Ok(completed(json!({"procedure_codes": [{"code": "02703DZ"}]}))),
        ]));
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();

        let outcome = next_outcome(&mut rx).await;
        assert!(matches!(outcome, PollerEvent::Completed { .. }));
        assert_eq!(api.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_everything_silently() {
        let api = Arc::new(ScriptedApi::default());
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();
        drain(&mut rx);

        poller.cancel();
        assert_eq!(poller.phase(), Phase::Idle);
        assert!(poller.snapshot().is_none());

        time::sleep(Duration::from_secs(10 * 60)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(api.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_submit_discards_response() {
        let api = Arc::new(ScriptedApi {
            submit_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        let (poller, mut rx) = poller_with(api.clone());

        let pending = tokio::spawn({
            let poller = poller.clone();
            async move { poller.submit(chest_pain()).await }
        });
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(poller.phase(), Phase::Submitting);

        poller.cancel();
        let outcome = pending.await.unwrap();

        assert_eq!(outcome, Err(WorkflowError::Cancelled));
        assert_eq!(poller.phase(), Phase::Idle);
        assert_eq!(drain(&mut rx), vec![PollerEvent::PhaseChanged(Phase::Submitting)]);

        time::sleep(Duration::from_secs(10 * 60)).await;
        assert_eq!(api.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_begin_and_send_skips_request() {
        let api = Arc::new(ScriptedApi::default());
        let (poller, mut rx) = poller_with(api.clone());

        let token = poller.begin(&chest_pain()).unwrap();
        assert_eq!(poller.phase(), Phase::Submitting);
        poller.cancel();

        let outcome = poller.send(token, chest_pain()).await;
        assert_eq!(outcome, Err(WorkflowError::Cancelled));
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 0);
        assert_eq!(poller.phase(), Phase::Idle);
        assert_eq!(drain(&mut rx), vec![PollerEvent::PhaseChanged(Phase::Submitting)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_rejected_uses_server_message() {
        let api = Arc::new(ScriptedApi::default());
        *api.submit_outcome.lock().unwrap() = Some(Err(ApiError::Rejected {
            status: 400,
            message: Some("Document content is required".to_string()),
        }));
        let (poller, mut rx) = poller_with(api.clone());

        let outcome = poller.submit(chest_pain()).await;
        let expected = WorkflowError::SubmissionRejected("Document content is required".to_string());

        assert_eq!(outcome, Err(expected.clone()));
        assert_eq!(poller.phase(), Phase::Failed);
        assert_eq!(
            drain(&mut rx),
            vec![
                PollerEvent::PhaseChanged(Phase::Submitting),
                PollerEvent::PhaseChanged(Phase::Failed),
                PollerEvent::Failed(expected),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_rejected_without_message_is_generic() {
        let api = Arc::new(ScriptedApi::default());
        *api.submit_outcome.lock().unwrap() = Some(Err(ApiError::Rejected {
            status: 500,
            message: None,
        }));
        let (poller, _rx) = poller_with(api);

        assert_eq!(
            poller.submit(chest_pain()).await,
            Err(WorkflowError::SubmissionRejected(GENERIC_SUBMIT_FAILURE.to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_document_never_leaves_idle() {
        let api = Arc::new(ScriptedApi::default());
        let (poller, mut rx) = poller_with(api.clone());

        let outcome = poller
            .submit(DocumentSubmission::new("Jane", DocumentType::FollowUp, "   "))
            .await;

        assert!(matches!(outcome, Err(WorkflowError::InvalidDocument(_))));
        assert_eq!(poller.phase(), Phase::Idle);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(api.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_after_terminal_starts_fresh_job() {
        let api = Arc::new(ScriptedApi::with_statuses(vec![Err(ApiError::NotFound(
            "w1".to_string(),
        ))]));
        let (poller, mut rx) = poller_with(api.clone());

        poller.submit(chest_pain()).await.unwrap();
        next_outcome(&mut rx).await;
        let first = poller.snapshot().unwrap().token;

        *api.submit_outcome.lock().unwrap() = Some(Ok(SubmitResponse {
            workflow_id: "w2".to_string(),
            document_id: None,
            status: None,
            message: None,
        }));
        let second_id = poller.submit(chest_pain()).await.unwrap();

        let job = poller.snapshot().unwrap();
        assert_eq!(second_id, "w2");
        assert_eq!(job.workflow_id, "w2");
        assert_ne!(job.token, first);
        assert_eq!(poller.phase(), Phase::Polling);
        poller.cancel();
    }
}
