//! Coding Result Model
//!
//! The payload of a completed workflow: ICD-10 diagnosis and procedure codes
//! plus the quality figures the service computed for them.
//!
//! The service has shipped a few shapes of this payload over time, and the
//! code entries are model-generated, so a payload may carry the current field
//! names, the older ones (`diagnoses`, `procedures`, `confidence`, `quality`,
//! `model`, `processing_time`), or both. Every field is kept as sent and the
//! accessor methods pick the first usable value, then apply display defaults.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "Claude 3.5 Sonnet (Amazon Bedrock)";
pub const DEFAULT_CODE_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_CATEGORY: &str = "General";
const NO_DESCRIPTION: &str = "No description available";

/// One diagnosis or procedure code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl MedicalCode {
    /// Code value; `position` is zero-based and only used for the fallback label.
    pub fn code_label(&self, position: usize) -> String {
        non_empty(&self.code)
            .or_else(|| non_empty(&self.id))
            .map(str::to_string)
            .unwrap_or_else(|| format!("CODE-{}", position + 1))
    }

    pub fn description(&self) -> &str {
        non_empty(&self.description)
            .or_else(|| non_empty(&self.name))
            .or_else(|| non_empty(&self.condition))
            .unwrap_or(NO_DESCRIPTION)
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CODE_CONFIDENCE)
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence())
    }

    pub fn category(&self) -> &str {
        non_empty(&self.category).unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }
}

/// Confidence banding used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceLevel::High
        } else if score >= 0.7 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Quality figures, all percentages in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_efficiency: Option<f64>,
}

impl QualityMetrics {
    pub fn accuracy_pct(&self) -> f64 {
        self.code_accuracy
            .or(self.completeness_score)
            .or(self.accuracy)
            .unwrap_or(0.0)
    }

    pub fn compliance_pct(&self) -> f64 {
        self.compliance_score.or(self.compliance).unwrap_or(0.0)
    }
}

static NO_METRICS: QualityMetrics = QualityMetrics {
    code_accuracy: None,
    completeness_score: None,
    accuracy: None,
    compliance_score: None,
    compliance: None,
    processing_efficiency: None,
};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Result of a completed coding workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodingResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_codes: Option<Vec<MedicalCode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnoses: Option<Vec<MedicalCode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_codes: Option<Vec<MedicalCode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedures: Option<Vec<MedicalCode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_review: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_version: Option<String>,
}

impl CodingResult {
    /// Interpret a raw `result` payload.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// `diagnosis_codes`, or `diagnoses` when that list is missing or empty.
    pub fn diagnosis_codes(&self) -> &[MedicalCode] {
        first_list(&self.diagnosis_codes, &self.diagnoses)
    }

    pub fn procedure_codes(&self) -> &[MedicalCode] {
        first_list(&self.procedure_codes, &self.procedures)
    }

    pub fn total_codes(&self) -> usize {
        self.diagnosis_codes().len() + self.procedure_codes().len()
    }

    pub fn overall_confidence(&self) -> f64 {
        self.overall_confidence.or(self.confidence).unwrap_or(0.0)
    }

    pub fn quality_metrics(&self) -> &QualityMetrics {
        self.quality_metrics
            .as_ref()
            .or(self.quality.as_ref())
            .unwrap_or(&NO_METRICS)
    }

    pub fn model_name(&self) -> &str {
        non_empty(&self.ai_model)
            .or_else(|| non_empty(&self.model))
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn processing_time(&self) -> f64 {
        self.processing_time_seconds
            .or(self.processing_time)
            .unwrap_or(0.0)
    }

    /// Notice shown once results are on screen.
    pub fn completion_notice(&self) -> (String, NoticeKind) {
        let total = self.total_codes();
        if total > 0 {
            (
                format!("Successfully processed document with {} codes generated!", total),
                NoticeKind::Success,
            )
        } else {
            (
                "Document processed, but no codes were generated.".to_string(),
                NoticeKind::Warning,
            )
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn first_list<'a>(
    primary: &'a Option<Vec<MedicalCode>>,
    legacy: &'a Option<Vec<MedicalCode>>,
) -> &'a [MedicalCode] {
    primary
        .as_deref()
        .filter(|codes| !codes.is_empty())
        .or(legacy.as_deref())
        .unwrap_or(&[])
}

/// Format a [0, 1] score as a percentage with one decimal.
pub fn format_score(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}
