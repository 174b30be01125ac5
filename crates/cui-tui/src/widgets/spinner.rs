//! Tick-driven activity indicator

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner advanced by the app tick rather than wall time
pub struct Spinner<'a> {
    label: &'a str,
    theme: &'a Theme,
    tick: usize,
}

impl<'a> Spinner<'a> {
    pub fn new(label: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            theme,
            tick: 0,
        }
    }

    pub fn with_tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()]
    }
}

impl Widget for Spinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 {
            return;
        }
        Line::from(vec![
            Span::styled(self.frame(), self.theme.accent_style()),
            Span::raw(" "),
            Span::styled(self.label, self.theme.dim_style()),
        ])
        .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wraps() {
        let theme = Theme::dark();
        assert_eq!(Spinner::new("x", &theme).with_tick(0).frame(), "⠋");
        assert_eq!(
            Spinner::new("x", &theme).with_tick(SPINNER_FRAMES.len() + 1).frame(),
            "⠙"
        );
    }
}
