//! Home view: tabbed conversation feed with live status

use std::sync::Arc;

use cui_api::ConversationBackend;
use cui_feed::{
    ConversationWithLiveStatus, Feed, FeedEvent, FeedSnapshot, Tab, Trigger, Visibility,
};
use cui_tui::{
    Action, App, AppState, Theme,
    widgets::{Spinner, TaskList, TaskListState, TaskTabs},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// Rows from the end at which scrolling down pulls the next page
const LOAD_MORE_THRESHOLD: usize = 3;

/// What the loop should do after an action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Trigger(Trigger),
    LoadMore,
    Quit,
}

/// Render state for the home view
pub struct HomeView {
    tab: Tab,
    snapshot: FeedSnapshot,
    items: Vec<ConversationWithLiveStatus>,
    list: TaskListState,
    theme: Theme,
    tick: usize,
    focused: bool,
    page: usize,
}

impl HomeView {
    pub fn new(tab: Tab, theme: Theme) -> Self {
        Self {
            tab,
            snapshot: FeedSnapshot::default(),
            items: Vec::new(),
            list: TaskListState::default(),
            theme,
            tick: 0,
            focused: true,
            page: 10,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn selected(&self) -> Option<&ConversationWithLiveStatus> {
        self.list.selected().and_then(|i| self.items.get(i))
    }

    /// Take the latest feed state
    pub fn update(&mut self, snapshot: FeedSnapshot, items: Vec<ConversationWithLiveStatus>) {
        self.snapshot = snapshot;
        self.items = items;
        self.list.clamp(self.items.len());
    }

    fn switch_tab(&mut self, tab: Tab) -> Vec<Command> {
        if tab == self.tab {
            return Vec::new();
        }
        self.tab = tab;
        self.list.first(self.items.len());
        vec![Command::Trigger(Trigger::FilterChanged(tab.filter()))]
    }

    fn scrolled(&self) -> Vec<Command> {
        if self.snapshot.has_more
            && !self.snapshot.loading_more
            && self.list.near_end(self.items.len(), LOAD_MORE_THRESHOLD)
        {
            vec![Command::LoadMore]
        } else {
            Vec::new()
        }
    }

    pub fn handle_action(&mut self, action: Action) -> Vec<Command> {
        let len = self.items.len();
        match action {
            Action::Quit | Action::Interrupt | Action::Char('q') => vec![Command::Quit],
            Action::Tab => self.switch_tab(self.tab.next()),
            Action::BackTab => self.switch_tab(self.tab.previous()),
            Action::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                self.switch_tab(Tab::ALL[index])
            }
            Action::Up | Action::Char('k') => {
                self.list.previous(len);
                Vec::new()
            }
            Action::Down | Action::Char('j') => {
                self.list.next(len);
                self.scrolled()
            }
            Action::PageUp => {
                self.list.page_up(len, self.page);
                Vec::new()
            }
            Action::PageDown => {
                self.list.page_down(len, self.page);
                self.scrolled()
            }
            Action::Home => {
                self.list.first(len);
                Vec::new()
            }
            Action::End => {
                self.list.last(len);
                vec![Command::LoadMore]
            }
            Action::Char('m') => vec![Command::LoadMore],
            Action::Char('r') | Action::Refresh => vec![Command::Trigger(Trigger::Manual)],
            Action::FocusGained => {
                let mut commands = vec![Command::Trigger(Trigger::WindowFocus)];
                if !self.focused {
                    commands.push(Command::Trigger(Trigger::VisibilityChanged(
                        Visibility::Visible,
                    )));
                }
                self.focused = true;
                commands
            }
            Action::FocusLost => {
                self.focused = false;
                vec![Command::Trigger(Trigger::VisibilityChanged(Visibility::Hidden))]
            }
            _ => Vec::new(),
        }
    }

    fn footer(&self) -> Option<String> {
        if self.snapshot.loading_more {
            Some("Loading more…".to_string())
        } else if self.snapshot.has_more {
            Some("m  load more".to_string())
        } else if self.snapshot.has_loaded && self.items.is_empty() {
            Some("No conversations".to_string())
        } else {
            None
        }
    }

    fn status_line(&self) -> Line<'_> {
        if let Some(error) = &self.snapshot.error {
            let hint = if error.is_auth() {
                " (run `cui --login <url>`)"
            } else {
                " (r to retry)"
            };
            return Line::from(vec![
                Span::styled(format!("Error: {}", error), self.theme.error_style()),
                Span::styled(hint, self.theme.dim_style()),
            ]);
        }
        Line::from(Span::styled(
            format!(
                "{} conversations · Tab switch · m more · r refresh · q quit",
                self.items.len()
            ),
            self.theme.dim_style(),
        ))
    }
}

impl AppState for HomeView {
    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        frame.render_widget(TaskTabs::new(self.tab, &self.theme), chunks[0]);

        let list_area = chunks[2];
        self.page = (list_area.height as usize / 2).max(1);
        let list = TaskList::new(&self.items, &self.theme).with_footer(self.footer());
        frame.render_stateful_widget(list, list_area, &mut self.list);

        if self.snapshot.loading && self.snapshot.error.is_none() {
            frame.render_widget(
                Spinner::new("Loading conversations", &self.theme).with_tick(self.tick),
                chunks[3],
            );
        } else {
            frame.render_widget(Paragraph::new(self.status_line()), chunks[3]);
        }
    }

    fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

fn execute(feed: &Feed, command: Command) {
    match command {
        Command::Trigger(trigger) => {
            feed.coordinator.handle(trigger);
        }
        Command::LoadMore => {
            let store = feed.store.clone();
            tokio::spawn(async move {
                store.load_more().await;
            });
        }
        Command::Quit => {}
    }
}

/// Run the home view until the user quits
pub async fn run(backend: Arc<dyn ConversationBackend>, tab: Tab, theme: Theme) -> anyhow::Result<()> {
    let (feed, queue) = Feed::new(backend);
    let mut events = feed.subscribe();
    let cancel = CancellationToken::new();
    let queue_task = tokio::spawn(queue.run(feed.store.clone(), cancel.clone()));

    let mut app = App::new()?.with_theme(theme.clone());
    let mut view = HomeView::new(tab, theme);
    let mut tick_interval = tokio::time::interval(app.tick_rate());

    feed.coordinator.handle(Trigger::Mount);
    feed.coordinator.handle(Trigger::FilterChanged(tab.filter()));

    let mut dirty = true;
    let result = loop {
        if dirty {
            view.update(feed.snapshot(), feed.conversations());
            dirty = false;
        }
        app.draw(&mut view)?;

        tokio::select! {
            biased;

            event = events.recv() => match event {
                Ok(event) => {
                    if let FeedEvent::RefreshApplied { .. } = event {
                        let opened = feed.sync_streams();
                        if opened > 0 {
                            tracing::debug!("Subscribed to {} live conversations", opened);
                        }
                    }
                    dirty = event.changes_view();
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Feed events lagged by {}", skipped);
                    dirty = true;
                }
                Err(RecvError::Closed) => break Ok(()),
            },

            action = app.next_action() => match action {
                Some(Ok(action)) => {
                    let commands = view.handle_action(action);
                    if commands.contains(&Command::Quit) {
                        break Ok(());
                    }
                    for command in commands {
                        execute(&feed, command);
                    }
                    dirty = true;
                }
                Some(Err(e)) => break Err(anyhow::anyhow!("Event error: {}", e)),
                None => break Ok(()),
            },

            _ = tick_interval.tick() => view.tick(),
        }
    };

    cancel.cancel();
    feed.streams.close_all();
    let _ = queue_task.await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cui_api::{ConversationStatus, ConversationSummary, ErrorKind};
    use cui_feed::FeedError;
    use ratatui::{Terminal, backend::TestBackend};

    fn item(id: &str) -> ConversationWithLiveStatus {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        ConversationWithLiveStatus {
            summary: ConversationSummary {
                session_id: id.into(),
                project_path: "/work/cui".into(),
                summary: format!("Conversation {id}"),
                custom_name: None,
                created_at: at,
                updated_at: at,
                message_count: 1,
                model: None,
                archived: false,
                continuation_session_id: None,
                status: ConversationStatus::Completed,
                streaming_id: None,
            },
            live_status: None,
        }
    }

    fn view_with(n: usize, has_more: bool) -> HomeView {
        let mut view = HomeView::new(Tab::Tasks, Theme::dark());
        let items: Vec<_> = (0..n).map(|i| item(&format!("s{i}"))).collect();
        let snapshot = FeedSnapshot {
            conversations: items.iter().map(|i| i.summary.clone()).collect(),
            filter: Tab::Tasks.filter(),
            has_more,
            has_loaded: true,
            ..Default::default()
        };
        view.update(snapshot, items);
        view
    }

    fn screen(view: &mut HomeView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| view.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_tab_keys_change_filter() {
        let mut view = view_with(2, false);
        assert_eq!(
            view.handle_action(Action::Tab),
            vec![Command::Trigger(Trigger::FilterChanged(Tab::History.filter()))]
        );
        assert_eq!(view.tab(), Tab::History);

        assert_eq!(
            view.handle_action(Action::Char('3')),
            vec![Command::Trigger(Trigger::FilterChanged(Tab::Archive.filter()))]
        );
        // same tab again is a no-op
        assert!(view.handle_action(Action::Char('3')).is_empty());

        view.handle_action(Action::BackTab);
        assert_eq!(view.tab(), Tab::History);
    }

    #[test]
    fn test_focus_pairs_drive_visibility() {
        let mut view = view_with(1, false);
        assert_eq!(
            view.handle_action(Action::FocusGained),
            vec![Command::Trigger(Trigger::WindowFocus)]
        );
        assert_eq!(
            view.handle_action(Action::FocusLost),
            vec![Command::Trigger(Trigger::VisibilityChanged(Visibility::Hidden))]
        );
        assert_eq!(
            view.handle_action(Action::FocusGained),
            vec![
                Command::Trigger(Trigger::WindowFocus),
                Command::Trigger(Trigger::VisibilityChanged(Visibility::Visible)),
            ]
        );
    }

    #[test]
    fn test_scrolling_near_end_loads_more() {
        let mut view = view_with(6, true);
        assert!(view.handle_action(Action::Down).is_empty());
        view.handle_action(Action::Down);
        assert_eq!(view.handle_action(Action::Down), vec![Command::LoadMore]);

        let mut exhausted = view_with(6, false);
        for _ in 0..6 {
            assert!(exhausted.handle_action(Action::Down).is_empty());
        }
        assert_eq!(exhausted.selected().map(|i| i.summary.session_id.as_str()), Some("s5"));
    }

    #[test]
    fn test_quit_and_refresh_keys() {
        let mut view = view_with(0, false);
        assert_eq!(view.handle_action(Action::Char('q')), vec![Command::Quit]);
        assert_eq!(view.handle_action(Action::Interrupt), vec![Command::Quit]);
        assert_eq!(
            view.handle_action(Action::Char('r')),
            vec![Command::Trigger(Trigger::Manual)]
        );
        assert_eq!(
            view.handle_action(Action::Refresh),
            vec![Command::Trigger(Trigger::Manual)]
        );
        assert_eq!(view.handle_action(Action::Char('m')), vec![Command::LoadMore]);
    }

    #[test]
    fn test_render_feed() {
        let mut view = view_with(2, true);
        let text = screen(&mut view);
        assert!(text.contains("1 Tasks"));
        assert!(text.contains("Conversation s0"));
        assert!(text.contains("Conversation s1"));
        assert!(text.contains("m  load more"));
        assert!(text.contains("2 conversations"));
    }

    #[test]
    fn test_render_error_and_empty() {
        let mut view = view_with(0, false);
        let text = screen(&mut view);
        assert!(text.contains("No conversations"));

        let snapshot = FeedSnapshot {
            error: Some(FeedError::new(ErrorKind::Authentication, "401 Unauthorized")),
            has_loaded: true,
            ..Default::default()
        };
        view.update(snapshot, Vec::new());
        let text = screen(&mut view);
        assert!(text.contains("Error: 401 Unauthorized"));
        assert!(text.contains("cui --login"));
    }
}
