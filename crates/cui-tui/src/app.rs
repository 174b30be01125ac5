//! Terminal setup and the event source for the console

use crate::input::{Action, event_to_action};
use crate::theme::Theme;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;

/// Application state trait
pub trait AppState {
    /// Render the UI
    fn render(&mut self, frame: &mut ratatui::Frame);

    /// Called on each tick (for animations)
    fn tick(&mut self) {}
}

/// Owns the terminal while the console runs.
///
/// Focus reporting is enabled so window focus arrives as
/// [`Action::FocusGained`] / [`Action::FocusLost`]. The terminal is
/// restored on drop.
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    events: EventStream,
    theme: Theme,
    tick_rate: Duration,
}

impl App {
    /// Create a new application
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            events: EventStream::new(),
            theme: Theme::default(),
            tick_rate: Duration::from_millis(100),
        })
    }

    /// Set the color theme
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set the tick rate for animations
    pub fn with_tick_rate(mut self, rate: Duration) -> Self {
        self.tick_rate = rate;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Draw one frame
    pub fn draw<S: AppState>(&mut self, state: &mut S) -> io::Result<()> {
        self.terminal.draw(|frame| state.render(frame))?;
        Ok(())
    }

    /// Height of the terminal in rows
    pub fn height(&self) -> io::Result<u16> {
        Ok(self.terminal.size()?.height)
    }

    /// Next terminal event that maps to an action. `None` once input ends.
    ///
    /// Cancel safe: unmapped events are dropped, nothing is buffered here.
    pub async fn next_action(&mut self) -> Option<io::Result<Action>> {
        loop {
            match self.events.next().await? {
                Ok(event) => {
                    if let Some(action) = event_to_action(event) {
                        return Some(Ok(action));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableFocusChange
        );
        let _ = self.terminal.show_cursor();
    }
}
