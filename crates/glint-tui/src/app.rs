//! Terminal host loop
//!
//! Owns the terminal, translates events through [`crate::input`], and hands
//! them to an async handler. Mouse capture stays enabled for the lifetime
//! of the host: region drags and outside-click detection depend on it.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        EventStream,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::input::{UiEvent, event_to_ui_event};
use crate::theme::Theme;

/// Host-side view state
pub trait HostState {
    /// Render the current frame
    fn render(&self, frame: &mut ratatui::Frame);

    /// Called on each tick (marker spinner animation)
    fn tick(&mut self) {}
}

/// Terminal host runner
pub struct Host {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
    tick_rate: Duration,
}

impl Host {
    /// Take over the terminal
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
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

    /// Get the theme
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Drive the host: render, wait for the next event or tick, and hand
    /// events to the handler. The handler returns false to stop.
    pub async fn run<S, F, Fut>(&mut self, state: &mut S, mut handler: F) -> io::Result<()>
    where
        S: HostState,
        F: FnMut(&mut S, UiEvent) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let mut events = EventStream::new();

        loop {
            self.terminal.draw(|frame| {
                state.render(frame);
            })?;

            match tokio::time::timeout(self.tick_rate, events.next()).await {
                Ok(Some(Ok(event))) => {
                    if let Some(ui_event) = event_to_ui_event(event) {
                        if !handler(state, ui_event).await {
                            return Ok(());
                        }
                    }
                }
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => return Ok(()),
                Err(_) => state.tick(),
            }
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}
