//! Tasks / History / Archive tab bar

use crate::theme::Theme;
use cui_feed::Tab;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Tabs, Widget},
};

pub struct TaskTabs<'a> {
    active: Tab,
    theme: &'a Theme,
}

impl<'a> TaskTabs<'a> {
    pub fn new(active: Tab, theme: &'a Theme) -> Self {
        Self { active, theme }
    }
}

impl Widget for TaskTabs<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.label())))
            .collect();
        let selected = Tab::ALL
            .iter()
            .position(|t| *t == self.active)
            .unwrap_or(0);

        Tabs::new(titles)
            .select(selected)
            .style(self.theme.dim_style())
            .highlight_style(self.theme.accent_bold())
            .divider(Span::styled("│", self.theme.border_style()))
            .render(area, buf);
    }
}
