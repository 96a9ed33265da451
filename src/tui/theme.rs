//! Colours and styles.
//!
//! The palette follows the coding service's web front end (Bootstrap 5
//! contextual colours) so both clients read the same way.

use ratatui::style::{Color, Modifier, Style};

use crate::coding::{ConfidenceLevel, NoticeKind};

/// Palette and style helpers
pub struct Theme;

impl Theme {
    // Contextual
    /// Bootstrap primary
    pub const ACCENT: Color = Color::Rgb(13, 110, 253);
    pub const SUCCESS: Color = Color::Rgb(25, 135, 84);
    pub const WARNING: Color = Color::Rgb(255, 193, 7);
    pub const ERROR: Color = Color::Rgb(220, 53, 69);
    pub const INFO: Color = Color::Rgb(13, 202, 240);

    // Text
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 249, 250);
    pub const TEXT_SECONDARY: Color = Color::Rgb(173, 181, 189);
    pub const TEXT_DIM: Color = Color::Rgb(108, 117, 125);

    // Borders
    pub const BORDER: Color = Color::Rgb(73, 80, 87);
    pub const BORDER_FOCUSED: Color = Self::ACCENT;

    // Code category tag (Bootstrap purple)
    pub const CATEGORY: Color = Color::Rgb(111, 66, 193);

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn heading() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::BORDER_FOCUSED)
    }

    /// Selected item style
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Keyboard shortcut style
    pub fn shortcut_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn shortcut_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Active/in-progress indicator
    pub fn active() -> Style {
        Style::default()
            .fg(Self::WARNING)
            .add_modifier(Modifier::BOLD)
    }

    pub fn complete() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn pending() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    pub fn placeholder() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    /// Gauge fill
    pub fn gauge() -> Style {
        Style::default().fg(Self::ACCENT).bg(Color::Rgb(26, 26, 26))
    }

    /// Badge for the primary code
    pub fn badge_primary() -> Style {
        Style::default()
            .fg(Color::White)
            .bg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn category() -> Style {
        Style::default().fg(Self::CATEGORY)
    }

    /// Confidence colouring: >= 0.9 green, >= 0.7 amber, else red
    pub fn confidence(level: ConfidenceLevel) -> Style {
        let color = match level {
            ConfidenceLevel::High => Self::SUCCESS,
            ConfidenceLevel::Medium => Self::WARNING,
            ConfidenceLevel::Low => Self::ERROR,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn notice(kind: NoticeKind) -> Style {
        let color = match kind {
            NoticeKind::Info => Self::INFO,
            NoticeKind::Success => Self::SUCCESS,
            NoticeKind::Warning => Self::WARNING,
            NoticeKind::Error => Self::ERROR,
        };
        Style::default().fg(color)
    }
}

/// Glyphs for stages and notices
pub struct Icons;

impl Icons {
    pub const COMPLETE: &'static str = "✓";
    pub const ACTIVE: &'static str = "●";
    pub const PENDING: &'static str = "○";
    pub const ERROR: &'static str = "✗";
    pub const ARROW: &'static str = "→";
    pub const SELECTED: &'static str = "▶";
    pub const DOT: &'static str = "•";
    pub const INFO: &'static str = "i";
    pub const WARNING: &'static str = "!";

    pub fn notice(kind: NoticeKind) -> &'static str {
        match kind {
            NoticeKind::Info => Self::INFO,
            NoticeKind::Success => Self::COMPLETE,
            NoticeKind::Warning => Self::WARNING,
            NoticeKind::Error => Self::ERROR,
        }
    }
}
