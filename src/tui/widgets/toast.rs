//! Toast Widget
//!
//! Stacks the live toasts in the top-right corner, newest at the bottom.

use crate::tui::app::Toast;
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const TOAST_WIDTH: u16 = 48;
const TOAST_HEIGHT: u16 = 3;

pub fn render_toasts(frame: &mut Frame, area: Rect, toasts: &[Toast]) {
    let width = TOAST_WIDTH.min(area.width);
    let x = area.x + area.width - width;
    let mut y = area.y + 1;

    for toast in toasts {
        if y + TOAST_HEIGHT > area.y + area.height {
            break;
        }

        let rect = Rect::new(x, y, width, TOAST_HEIGHT);
        let style = Theme::notice(toast.kind);
        let line = Line::from(vec![
            Span::styled(format!("{} ", Icons::notice(toast.kind)), style),
            Span::styled(toast.message.clone(), Theme::text()),
        ]);

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).border_style(style)),
            rect,
        );

        y += TOAST_HEIGHT;
    }
}
