//! Workflow Service API
//!
//! The [`WorkflowApi`] trait is the seam between the poller and the network;
//! [`HttpWorkflowApi`] is the reqwest implementation used by the binary.

pub mod client;

pub use client::HttpWorkflowApi;

use async_trait::async_trait;

use crate::models::{DocumentSubmission, SampleDocument, StatusResponse, SubmitResponse};

/// Errors from the workflow service layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service refused a submission.
    #[error("Submission rejected ({status}): {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected { status: u16, message: Option<String> },

    /// The service does not know the workflow id.
    #[error("Workflow not found: {0}")]
    NotFound(String),

    /// Any other non-2xx answer.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A 2xx body that did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_) | ApiError::Status { status: 404, .. })
    }

    /// Message supplied by the service itself, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Start a coding workflow for a document.
    async fn submit(&self, document: &DocumentSubmission) -> Result<SubmitResponse, ApiError>;

    /// Fetch the current status of a workflow.
    async fn status(&self, workflow_id: &str) -> Result<StatusResponse, ApiError>;

    /// Example documents offered by the service.
    async fn sample_documents(&self) -> Result<Vec<SampleDocument>, ApiError>;
}
