//! Single-line text input for the prompt field and the panel's follow-up box

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::input::Action;
use crate::theme::Theme;

/// Single-line text input widget
#[derive(Debug, Default)]
pub struct PromptInput {
    /// Current input text
    content: String,
    /// Cursor position (character index, not byte index)
    cursor: usize,
    /// Horizontal scroll offset (in display width)
    scroll: usize,
    /// Placeholder text
    placeholder: String,
    /// Whether the input is focused
    focused: bool,
    /// Disabled while a round trip is in flight
    disabled: bool,
}

impl PromptInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set placeholder text
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set focus state
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Enable or disable editing
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Get the current content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Set the content, placing the cursor at the end
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.chars().count();
        self.scroll = 0;
    }

    /// Clear the content
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    fn cursor_byte_offset(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn cursor_display_width(&self) -> usize {
        self.content
            .chars()
            .take(self.cursor)
            .map(|c| c.to_string().width())
            .sum()
    }

    fn remove_char_at_cursor(&mut self) {
        let start = self.cursor_byte_offset();
        let end = self.content[start..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| start + i)
            .unwrap_or(self.content.len());
        self.content.drain(start..end);
    }

    /// Handle an editing action; returns whether anything changed. A
    /// disabled input swallows every action.
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        if self.disabled {
            return false;
        }
        let char_count = self.content.chars().count();

        let changed = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Newline => {
                // Single-line field: a modified Enter becomes a space
                self.insert_char(' ');
                true
            }
            Action::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_char_at_cursor();
                    true
                } else {
                    false
                }
            }
            Action::Delete => {
                if self.cursor < char_count {
                    self.remove_char_at_cursor();
                    true
                } else {
                    false
                }
            }
            Action::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    true
                } else {
                    false
                }
            }
            Action::Right => {
                if self.cursor < char_count {
                    self.cursor += 1;
                    true
                } else {
                    false
                }
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = char_count;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut new_cursor = self.cursor;
                while new_cursor > 0 && chars.get(new_cursor - 1) == Some(&' ') {
                    new_cursor -= 1;
                }
                while new_cursor > 0 && chars.get(new_cursor - 1) != Some(&' ') {
                    new_cursor -= 1;
                }
                let start_byte = self
                    .content
                    .char_indices()
                    .nth(new_cursor)
                    .map(|(i, _)| i)
                    .unwrap_or(self.content.len());
                let end_byte = self.cursor_byte_offset();
                self.content.drain(start_byte..end_byte);
                self.cursor = new_cursor;
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        if !self.content.ends_with(' ') && self.cursor > 0 {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                true
            }
            _ => false,
        };

        if changed {
            self.update_scroll(width as usize);
        }
        changed
    }

    fn insert_char(&mut self, c: char) {
        let byte_offset = self.cursor_byte_offset();
        self.content.insert(byte_offset, c);
        self.cursor += 1;
    }

    fn update_scroll(&mut self, width: usize) {
        let visible_width = width.saturating_sub(4);
        let cursor_pos = self.cursor_display_width();

        if cursor_pos < self.scroll {
            self.scroll = cursor_pos;
        } else if cursor_pos >= self.scroll + visible_width {
            self.scroll = cursor_pos - visible_width + 1;
        }
    }

    /// Render the input box
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let border_style = if self.disabled {
            theme.dim_style()
        } else if self.focused {
            theme.accent_style()
        } else {
            theme.border_style()
        };
        let block = Block::default().borders(Borders::ALL).border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let display_text = if self.content.is_empty() {
            self.placeholder.clone()
        } else {
            self.visible_slice(inner.width as usize)
        };

        let style = if self.content.is_empty() || self.disabled {
            theme.dim_style()
        } else {
            theme.base_style()
        };

        Paragraph::new(display_text).style(style).render(inner, buf);

        if self.focused && !self.disabled && inner.width > 0 {
            let cursor_x = self.cursor_display_width().saturating_sub(self.scroll);
            if cursor_x < inner.width as usize {
                let x = inner.x + cursor_x as u16;
                if let Some(cell) = buf.cell_mut((x, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }

    /// The horizontally scrolled window of content that fits the width
    fn visible_slice(&self, visible_width: usize) -> String {
        let chars: Vec<char> = self.content.chars().collect();
        let mut start_idx = 0;
        let mut current_width = 0;

        for (i, c) in chars.iter().enumerate() {
            if current_width >= self.scroll {
                start_idx = i;
                break;
            }
            current_width += c.to_string().width();
        }

        let mut visible = String::new();
        current_width = 0;
        for c in chars.iter().skip(start_idx) {
            let char_width = c.to_string().width();
            if current_width + char_width > visible_width {
                break;
            }
            visible.push(*c);
            current_width += char_width;
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_backspace() {
        let mut input = PromptInput::new();
        input.handle_action(&Action::Char('h'), 80);
        input.handle_action(&Action::Char('i'), 80);
        assert_eq!(input.content(), "hi");

        input.handle_action(&Action::Backspace, 80);
        assert_eq!(input.content(), "h");
    }

    #[test]
    fn test_disabled_input_swallows_actions() {
        let mut input = PromptInput::new();
        input.set_content("draft");
        input.set_disabled(true);
        assert!(!input.handle_action(&Action::Char('x'), 80));
        assert!(!input.handle_action(&Action::ClearLine, 80));
        assert_eq!(input.content(), "draft");
    }

    #[test]
    fn test_modified_enter_becomes_space() {
        let mut input = PromptInput::new();
        input.set_content("two");
        input.handle_action(&Action::Newline, 80);
        input.handle_action(&Action::Char('x'), 80);
        assert_eq!(input.content(), "two x");
    }

    #[test]
    fn test_delete_word() {
        let mut input = PromptInput::new();
        input.set_content("explain this text");
        input.handle_action(&Action::DeleteWord, 80);
        assert_eq!(input.content(), "explain this ");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = PromptInput::new();
        input.handle_action(&Action::Char('a'), 80);
        input.handle_action(&Action::Paste("b\r\nc".to_string()), 80);
        assert_eq!(input.content(), "ab c");
    }

    #[test]
    fn test_cursor_editing_mid_string() {
        let mut input = PromptInput::new();
        input.set_content("ac");
        input.handle_action(&Action::Left, 80);
        input.handle_action(&Action::Char('b'), 80);
        assert_eq!(input.content(), "abc");

        input.handle_action(&Action::Home, 80);
        input.handle_action(&Action::Delete, 80);
        assert_eq!(input.content(), "bc");
    }
}
