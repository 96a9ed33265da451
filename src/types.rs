// Error types shared across the client

/// Application-level failures outside a single job.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Everything that can go wrong with one workflow job.
///
/// Only the terminal kinds end a job. `Transport` is logged and retried on the
/// next poll; `InvalidDocument` and `Busy` are rejected before any state change;
/// `Cancelled` is what a submit returns when `cancel()` overtook it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    InvalidDocument(String),

    #[error("A document is already being processed")]
    Busy,

    #[error("Submission cancelled")]
    Cancelled,

    #[error("{0}")]
    SubmissionRejected(String),

    #[error("Status check failed: {0}")]
    Transport(String),

    #[error("Workflow not found. Please try again.")]
    NotFound,

    #[error("{0}")]
    WorkflowReported(String),

    #[error("Processing timed out. Please try again.")]
    Timeout,

    #[error("Workflow completed but no result")]
    EmptyResult,

    #[error("Workflow returned an unreadable result: {0}")]
    MalformedResult(String),
}

impl WorkflowError {
    /// True for the kinds that end a job.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            WorkflowError::InvalidDocument(_)
                | WorkflowError::Busy
                | WorkflowError::Cancelled
                | WorkflowError::Transport(_)
        )
    }
}
