//! Conversation panel widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// One message as the panel displays it
#[derive(Debug, Clone)]
pub struct PanelMessage {
    /// "You" or "AI"
    pub role_label: String,
    /// `HH:MM` timestamp label
    pub time_label: String,
    /// Message text
    pub content: String,
    /// Error replies render in the error style
    pub is_error: bool,
}

impl PanelMessage {
    pub fn new(
        role_label: impl Into<String>,
        time_label: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let is_error = content.starts_with("Error:");
        Self {
            role_label: role_label.into(),
            time_label: time_label.into(),
            content,
            is_error,
        }
    }
}

/// Widget for one open conversation panel
pub struct PanelView<'a> {
    messages: &'a [PanelMessage],
    theme: &'a Theme,
    copy_label: &'a str,
    input_disabled: bool,
    scroll: usize,
}

impl<'a> PanelView<'a> {
    pub fn new(messages: &'a [PanelMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            copy_label: "Copy All",
            input_disabled: false,
            scroll: 0,
        }
    }

    /// Label for the copy control (reflects copy feedback)
    pub fn copy_label(mut self, label: &'a str) -> Self {
        self.copy_label = label;
        self
    }

    /// Show the waiting hint while a round trip is in flight
    pub fn input_disabled(mut self, disabled: bool) -> Self {
        self.input_disabled = disabled;
        self
    }

    /// Set scroll offset in lines from the top
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    fn message_lines(&self, msg: &PanelMessage, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_style = if msg.role_label == "You" {
            self.theme.accent_bold()
        } else if msg.is_error {
            self.theme.error_style().add_modifier(Modifier::BOLD)
        } else {
            self.theme.success_style().add_modifier(Modifier::BOLD)
        };

        lines.push(Line::from(vec![
            Span::styled(msg.role_label.clone(), role_style),
            Span::styled(format!("  {}", msg.time_label), self.theme.dim_style()),
        ]));

        let body_style = if msg.is_error {
            self.theme.error_style()
        } else {
            self.theme.base_style()
        };
        for wrapped in textwrap::wrap(&msg.content, width.max(1)) {
            lines.push(Line::styled(wrapped.into_owned(), body_style));
        }

        lines.push(Line::default());
        lines
    }

    /// All lines of the panel body at the given inner width
    fn body_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for msg in self.messages {
            lines.extend(self.message_lines(msg, width));
        }
        if self.input_disabled {
            lines.push(Line::styled(
                "Waiting for reply...".to_string(),
                self.theme.dim_style(),
            ));
        }
        lines
    }
}

impl Widget for PanelView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(vec![
            Span::styled(" Conversation ", self.theme.accent_bold()),
            Span::styled(format!("[{}] ", self.copy_label), self.theme.dim_style()),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let lines = self.body_lines(inner.width as usize);

        // Newest content stays visible at the bottom unless scrolled
        let height = inner.height as usize;
        let start = if self.scroll > 0 {
            self.scroll.min(lines.len().saturating_sub(height))
        } else {
            lines.len().saturating_sub(height)
        };
        let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();

        Paragraph::new(visible).render(inner, buf);
    }
}
