// Plain-text rendering of a coding result for headless output

use std::fmt::Write;

use crate::coding::{format_score, CodingResult, ConfidenceLevel, MedicalCode};

const RULE_WIDTH: usize = 60;

/// Render a completed result as a human-readable report.
pub fn render_text(workflow_id: &str, result: &CodingResult) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Medical Coding Results");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Workflow:        {}", workflow_id);
    if let Some(doc) = result.document_id.as_deref() {
        let _ = writeln!(out, "Document:        {}", doc);
    }
    let _ = writeln!(out, "Total codes:     {}", result.total_codes());
    let _ = writeln!(out, "Confidence:      {}", format_score(result.overall_confidence()));
    let _ = writeln!(
        out,
        "Accuracy:        {:.1}%",
        result.quality_metrics().accuracy_pct()
    );
    let _ = writeln!(
        out,
        "Compliance:      {:.1}%",
        result.quality_metrics().compliance_pct()
    );
    let _ = writeln!(out, "Model:           {}", result.model_name());
    let _ = writeln!(out, "Processing time: {:.2}s", result.processing_time());
    if result.requires_review == Some(true) {
        let _ = writeln!(out, "Review:          required");
    }

    write_section(&mut out, "Diagnosis Codes (ICD-10-CM)", result.diagnosis_codes());
    write_section(&mut out, "Procedure Codes (ICD-10-PCS)", result.procedure_codes());

    out
}

fn write_section(out: &mut String, title: &str, codes: &[MedicalCode]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.len()));

    if codes.is_empty() {
        let _ = writeln!(out, "  No codes found");
        return;
    }

    for (i, code) in codes.iter().enumerate() {
        let primary = if code.is_primary() { " [PRIMARY]" } else { "" };
        let _ = writeln!(
            out,
            "  {:<10} {} ({}, {}){}",
            code.code_label(i),
            format_score(code.confidence()),
            level_name(code.confidence_level()),
            code.category(),
            primary
        );
        let _ = writeln!(out, "             {}", code.description());
        if let Some(evidence) = code.evidence.as_deref().filter(|e| !e.is_empty()) {
            let _ = writeln!(out, "             Evidence: {}", evidence);
        }
    }
}

fn level_name(level: ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::High => "high",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::Low => "low",
    }
}
