//! Poller Events
//!
//! What the poller tells the outside world. The view layer (progress bar,
//! result lists, toasts, form enablement) only ever sees these.

use tokio::sync::mpsc;
use tracing::debug;

use super::Phase;
use crate::coding::CodingResult;
use crate::types::WorkflowError;

#[derive(Debug, Clone, PartialEq)]
pub enum PollerEvent {
    /// The poller moved to a new phase. Busy phases disable submission.
    PhaseChanged(Phase),
    /// A `processing` status was received; values are forwarded unchanged.
    Progress {
        workflow_id: String,
        progress: f64,
        message: Option<String>,
    },
    /// The workflow finished with a result.
    Completed {
        workflow_id: String,
        result: CodingResult,
    },
    /// The job ended without a result.
    Failed(WorkflowError),
}

impl PollerEvent {
    /// True for the events that end a job.
    pub fn is_outcome(&self) -> bool {
        matches!(self, PollerEvent::Completed { .. } | PollerEvent::Failed(_))
    }
}

/// Receiver of poller events.
///
/// `emit` is called while the poller holds its state lock, so it must not
/// block and must not call back into the poller.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PollerEvent);
}

impl EventSink for mpsc::UnboundedSender<PollerEvent> {
    fn emit(&self, event: PollerEvent) {
        if self.send(event).is_err() {
            debug!("Poller event dropped: receiver closed");
        }
    }
}
