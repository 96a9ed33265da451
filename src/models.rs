// Wire models for the workflow service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::WorkflowError;

pub const DEFAULT_PATIENT_NAME: &str = "Unknown";

/// Kind of clinical document being coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Consultation,
    DischargeSummary,
    EmergencyConsultation,
    FollowUp,
    InpatientAdmission,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Consultation,
        DocumentType::DischargeSummary,
        DocumentType::EmergencyConsultation,
        DocumentType::FollowUp,
        DocumentType::InpatientAdmission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Consultation => "consultation",
            DocumentType::DischargeSummary => "discharge_summary",
            DocumentType::EmergencyConsultation => "emergency_consultation",
            DocumentType::FollowUp => "follow_up",
            DocumentType::InpatientAdmission => "inpatient_admission",
        }
    }

    /// Human label for selectors
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Consultation => "Consultation",
            DocumentType::DischargeSummary => "Discharge Summary",
            DocumentType::EmergencyConsultation => "Emergency Consultation",
            DocumentType::FollowUp => "Follow-up Visit",
            DocumentType::InpatientAdmission => "Inpatient Admission",
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Consultation
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown document type: {}", s))
    }
}

/// Body of `POST /api/process-document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSubmission {
    pub patient_name: String,
    pub document_type: DocumentType,
    pub content: String,
}

impl DocumentSubmission {
    /// Build a submission from raw form input.
    ///
    /// Name and content are trimmed; a blank name becomes `Unknown`.
    pub fn new(
        patient_name: impl AsRef<str>,
        document_type: DocumentType,
        content: impl AsRef<str>,
    ) -> Self {
        let patient_name = patient_name.as_ref().trim();
        Self {
            patient_name: if patient_name.is_empty() {
                DEFAULT_PATIENT_NAME.to_string()
            } else {
                patient_name.to_string()
            },
            document_type,
            content: content.as_ref().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.content.trim().is_empty() {
            return Err(WorkflowError::InvalidDocument(
                "Please enter document content".to_string(),
            ));
        }
        Ok(())
    }
}

/// Successful answer to a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub workflow_id: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{error}` body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Status reported by the service for one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStatus {
    Processing,
    Completed,
    Error,
    Other(String),
}

impl From<&str> for WorkflowStatus {
    fn from(s: &str) -> Self {
        match s {
            "processing" => WorkflowStatus::Processing,
            "completed" => WorkflowStatus::Completed,
            "error" => WorkflowStatus::Error,
            other => WorkflowStatus::Other(other.to_string()),
        }
    }
}

/// Body of `GET /api/workflow-status/{id}`.
///
/// `result` is kept as raw JSON; interpreting it is the job of
/// [`crate::coding::CodingResult`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl StatusResponse {
    pub fn workflow_status(&self) -> WorkflowStatus {
        WorkflowStatus::from(self.status.as_str())
    }

    pub fn processing(progress: f64, message: impl Into<String>) -> Self {
        Self {
            status: "processing".to_string(),
            progress,
            message: Some(message.into()),
            result: None,
        }
    }
}

/// Example document offered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDocument {
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub document_type: String,
}

impl SampleDocument {
    /// Patient name to prefill: the first two words of the sample name.
    pub fn patient_name_hint(&self) -> String {
        self.name.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
    }

    pub fn parsed_type(&self) -> Option<DocumentType> {
        self.document_type.parse().ok()
    }

    pub fn to_submission(&self) -> DocumentSubmission {
        DocumentSubmission::new(
            self.patient_name_hint(),
            self.parsed_type().unwrap_or_default(),
            &self.content,
        )
    }
}
