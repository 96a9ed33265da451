//! Results Widget
//!
//! Coding results, the error panel, and the initial hint screen all share the
//! right-hand panel.

use crate::coding::{format_score, CodingResult, MedicalCode};
use crate::tui::app::App;
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets::progress::truncate_string;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const INDENT: &str = "   ";

/// Render the results panel
pub fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(error) = &app.error {
        render_error(frame, area, error);
        return;
    }

    let Some(result) = &app.result else {
        render_initial(frame, area, app);
        return;
    };

    let block = Block::default()
        .title(" Coding Results ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = result_lines(result, inner.width as usize);
    let paragraph = Paragraph::new(lines).scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, inner);
}

/// One line per row; nothing wraps, so the line count is the content height.
pub fn result_lines(result: &CodingResult, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Total Codes ", Theme::text_secondary()),
        Span::styled(result.total_codes().to_string(), Theme::heading()),
        Span::raw("   "),
        Span::styled("Confidence ", Theme::text_secondary()),
        Span::styled(format_score(result.overall_confidence()), Theme::heading()),
        Span::raw("   "),
        Span::styled("Accuracy ", Theme::text_secondary()),
        Span::styled(
            format!("{:.1}%", result.quality_metrics().accuracy_pct()),
            Theme::heading(),
        ),
        Span::raw("   "),
        Span::styled("Compliance ", Theme::text_secondary()),
        Span::styled(
            format!("{:.1}%", result.quality_metrics().compliance_pct()),
            Theme::heading(),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Model ", Theme::text_secondary()),
        Span::styled(result.model_name().to_string(), Theme::text()),
        Span::raw("   "),
        Span::styled("Processing Time ", Theme::text_secondary()),
        Span::styled(format!("{:.2}s", result.processing_time()), Theme::text()),
    ]));

    push_section(&mut lines, "Diagnosis Codes (ICD-10-CM)", result.diagnosis_codes(), width);
    push_section(&mut lines, "Procedure Codes (ICD-10-PCS)", result.procedure_codes(), width);

    lines
}

fn push_section(lines: &mut Vec<Line<'static>>, title: &str, codes: &[MedicalCode], width: usize) {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} ({})", title, codes.len()),
        Theme::title(),
    )));

    if codes.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{}No codes found", INDENT),
            Theme::text_dim(),
        )));
        return;
    }

    let text_width = width.saturating_sub(INDENT.len());

    for (i, code) in codes.iter().enumerate() {
        let mut spans = vec![
            Span::styled(format!(" {} ", Icons::DOT), Theme::text_dim()),
            Span::styled(format!("{:<9}", code.code_label(i)), Theme::heading()),
            Span::styled(
                format!("{:>7}", format_score(code.confidence())),
                Theme::confidence(code.confidence_level()),
            ),
            Span::raw("  "),
            Span::styled(code.category().to_string(), Theme::category()),
        ];
        if code.is_primary() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(" PRIMARY ", Theme::badge_primary()));
        }
        lines.push(Line::from(spans));

        lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled(truncate_string(code.description(), text_width), Theme::text()),
        ]));

        if let Some(evidence) = code.evidence.as_deref().filter(|e| !e.is_empty()) {
            lines.push(Line::from(vec![
                Span::raw(INDENT),
                Span::styled(
                    truncate_string(&format!("Evidence: {}", evidence), text_width),
                    Theme::text_dim(),
                ),
            ]));
        }
    }
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::from(Span::styled(
            format!("{} Processing Error", Icons::ERROR),
            Theme::error(),
        )),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Theme::text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Ctrl+S]", Theme::shortcut_key()),
            Span::styled(" Try again  ", Theme::shortcut_desc()),
            Span::styled("[Ctrl+L]", Theme::shortcut_key()),
            Span::styled(" Clear", Theme::shortcut_desc()),
        ]),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(Theme::error()),
    );

    frame.render_widget(paragraph, area);
}

fn render_initial(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled("Ready to code", Theme::heading())),
        Line::from(""),
        Line::from(Span::styled(
            "Enter a medical document and press Ctrl+S to generate ICD-10 codes.",
            Theme::text_secondary(),
        )),
        Line::from(""),
    ];

    if app.samples.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sample documents unavailable",
            Theme::text_dim(),
        )));
    } else {
        lines.push(Line::from(Span::styled("Sample documents", Theme::heading())));
        for (i, sample) in app.samples.iter().take(3).enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" [F{}] ", i + 2), Theme::shortcut_key()),
                Span::styled(sample.name.clone(), Theme::text()),
                Span::styled(format!("  ({})", sample.document_type), Theme::text_dim()),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Results ")
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    frame.render_widget(paragraph, area);
}
