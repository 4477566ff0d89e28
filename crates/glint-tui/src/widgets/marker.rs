//! Bubble marker widget: the on-page anchor dot

use std::time::{Duration, Instant};

use ratatui::{buffer::Buffer, layout::Rect, text::Span, widgets::Widget};

use crate::theme::Theme;

/// Spinner animation frames shown while a bubble is loading
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Glyph for a resolved bubble
const MARKER_GLYPH: &str = "●";

/// One bubble's anchor. Animates while the bubble is waiting on its first
/// reply, then settles into a static dot.
pub struct BubbleMarker<'a> {
    loading: bool,
    theme: &'a Theme,
    start_time: Instant,
}

impl<'a> BubbleMarker<'a> {
    pub fn new(loading: bool, theme: &'a Theme) -> Self {
        Self {
            loading,
            theme,
            start_time: Instant::now(),
        }
    }

    /// Pin the animation to the bubble's creation time so redraws stay
    /// in phase
    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.start_time = start;
        self
    }

    fn current_frame(&self) -> &'static str {
        let elapsed = self.start_time.elapsed();
        let frame_duration = Duration::from_millis(80);
        let frame_index = (elapsed.as_millis() / frame_duration.as_millis()) as usize;
        SPINNER_FRAMES[frame_index % SPINNER_FRAMES.len()]
    }
}

impl Widget for BubbleMarker<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let glyph = if self.loading {
            self.current_frame()
        } else {
            MARKER_GLYPH
        };

        let span = Span::styled(glyph, self.theme.accent_style());
        buf.set_span(area.x, area.y, &span, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_marker_renders_dot() {
        let theme = Theme::dark();
        let mut buf = Buffer::empty(Rect::new(0, 0, 2, 1));
        BubbleMarker::new(false, &theme).render(Rect::new(0, 0, 2, 1), &mut buf);
        assert_eq!(buf.cell((0, 0)).unwrap().symbol(), MARKER_GLYPH);
    }

    #[test]
    fn test_loading_marker_renders_spinner_frame() {
        let theme = Theme::dark();
        let mut buf = Buffer::empty(Rect::new(0, 0, 2, 1));
        BubbleMarker::new(true, &theme)
            .with_start_time(Instant::now())
            .render(Rect::new(0, 0, 2, 1), &mut buf);
        let symbol = buf.cell((0, 0)).unwrap().symbol().to_string();
        assert!(SPINNER_FRAMES.contains(&symbol.as_str()));
    }
}
