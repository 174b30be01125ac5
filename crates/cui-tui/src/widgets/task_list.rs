//! Conversation list with live status overlay

use crate::theme::Theme;
use chrono::{DateTime, Utc};
use cui_feed::{ConversationWithLiveStatus, ToolMetrics};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{HighlightSpacing, List, ListItem, ListState, StatefulWidget},
};
use unicode_width::UnicodeWidthChar;

/// Selection state for [`TaskList`]
#[derive(Debug, Default, Clone)]
pub struct TaskListState {
    list: ListState,
}

impl TaskListState {
    pub fn selected(&self) -> Option<usize> {
        self.list.selected()
    }

    /// Keep the selection inside a list of `len` rows
    pub fn clamp(&mut self, len: usize) {
        match (self.list.selected(), len) {
            (_, 0) => self.list.select(None),
            (None, _) => self.list.select(Some(0)),
            (Some(i), len) if i >= len => self.list.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn next(&mut self, len: usize) {
        self.move_by(1, len);
    }

    pub fn previous(&mut self, len: usize) {
        self.move_by(-1, len);
    }

    pub fn page_down(&mut self, len: usize, page: usize) {
        self.move_by(page as isize, len);
    }

    pub fn page_up(&mut self, len: usize, page: usize) {
        self.move_by(-(page as isize), len);
    }

    pub fn first(&mut self, len: usize) {
        self.list.select((len > 0).then_some(0));
    }

    pub fn last(&mut self, len: usize) {
        self.list.select(len.checked_sub(1));
    }

    /// Whether the selection is within `threshold` rows of the end
    pub fn near_end(&self, len: usize, threshold: usize) -> bool {
        self.list
            .selected()
            .is_some_and(|i| i + threshold + 1 >= len)
    }

    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.list.select(None);
            return;
        }
        let current = self.list.selected().unwrap_or(0) as isize;
        let target = (current + delta).clamp(0, len as isize - 1);
        self.list.select(Some(target as usize));
    }
}

/// Renders the joined feed, two lines per conversation
pub struct TaskList<'a> {
    items: &'a [ConversationWithLiveStatus],
    theme: &'a Theme,
    now: DateTime<Utc>,
    footer: Option<String>,
}

impl<'a> TaskList<'a> {
    pub fn new(items: &'a [ConversationWithLiveStatus], theme: &'a Theme) -> Self {
        Self {
            items,
            theme,
            now: Utc::now(),
            footer: None,
        }
    }

    /// Reference time for relative timestamps
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Trailing line below the last row ("Loading more…", hints)
    pub fn with_footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer;
        self
    }

    fn row(&self, item: &ConversationWithLiveStatus, width: usize) -> ListItem<'a> {
        let summary = &item.summary;
        let marker = match &item.live_status {
            Some(status) => Span::styled("● ", self.theme.connection_style(status.connection)),
            None => Span::raw("  "),
        };
        let title = truncate(summary.title(), width.saturating_sub(4));
        let first = Line::from(vec![marker, Span::styled(title, self.theme.base_style())]);

        let mut details = vec![
            short_path(&summary.project_path).to_string(),
            relative_time(summary.updated_at, self.now),
        ];
        if let Some(status) = item.status_line() {
            details.push(status.to_string());
        }
        if let Some(badge) = item.live_status.as_ref().and_then(|s| metrics_badge(&s.metrics)) {
            details.push(badge);
        }
        let second = Line::from(Span::styled(
            truncate(&format!("  {}", details.join(" · ")), width.saturating_sub(2)),
            self.theme.dim_style(),
        ));

        ListItem::new(vec![first, second])
    }
}

impl StatefulWidget for TaskList<'_> {
    type State = TaskListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let width = area.width as usize;
        let mut rows: Vec<ListItem> = self.items.iter().map(|item| self.row(item, width)).collect();
        if let Some(footer) = &self.footer {
            rows.push(ListItem::new(Line::from(Span::styled(
                format!("  {}", footer),
                self.theme.dim_style(),
            ))));
        }

        let list = List::new(rows)
            .highlight_style(self.theme.selection_style())
            .highlight_symbol("▌")
            .highlight_spacing(HighlightSpacing::Always);

        StatefulWidget::render(list, area, buf, &mut state.list);
    }
}

/// "just now", "5m ago", "3h ago", "2d ago", then a date
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        then.format("%b %d").to_string()
    }
}

/// Line counts for a live session, if it touched any files
pub fn metrics_badge(metrics: &ToolMetrics) -> Option<String> {
    if metrics.lines_added == 0 && metrics.lines_removed == 0 {
        return None;
    }
    Some(format!("+{} -{}", metrics.lines_added, metrics.lines_removed))
}

/// Last component of a project path
pub fn short_path(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(path)
}

/// Cut `text` to at most `max_width` display columns, ending with "…" when cut
pub fn truncate(text: &str, max_width: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let total: usize = first_line.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return first_line.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in first_line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
