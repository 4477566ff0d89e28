//! Conversation panel: the expanded multi-turn view over one bubble

use async_trait::async_trait;

use crate::bubble::BubbleId;
use crate::error::Result;

/// Transient state of the copy control after a copy attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyFeedback {
    #[default]
    Idle,
    Copied,
    Failed,
}

impl CopyFeedback {
    /// Label shown on the copy control
    pub fn label(&self) -> &'static str {
        match self {
            CopyFeedback::Idle => "Copy All",
            CopyFeedback::Copied => "Copied!",
            CopyFeedback::Failed => "Copy failed",
        }
    }
}

/// The panel's input control
#[derive(Debug, Default)]
pub struct PanelInput {
    text: String,
    disabled: bool,
    focused: bool,
}

impl PanelInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

/// View state for one bubble's conversation. At most one panel is open per
/// page; the controller enforces that by closing the previous panel when a
/// new one opens.
pub struct Panel {
    bubble: BubbleId,
    input: PanelInput,
    /// Outside clicks close the panel only once this is armed, so the
    /// click that opened the panel cannot immediately close it.
    outside_click_armed: bool,
    copy_feedback: CopyFeedback,
}

impl Panel {
    /// Open a panel over the given bubble, input focused
    pub fn new(bubble: BubbleId) -> Self {
        Self {
            bubble,
            input: PanelInput {
                focused: true,
                ..Default::default()
            },
            outside_click_armed: false,
            copy_feedback: CopyFeedback::Idle,
        }
    }

    pub fn bubble(&self) -> BubbleId {
        self.bubble
    }

    pub fn input(&self) -> &PanelInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut PanelInput {
        &mut self.input
    }

    /// Arm the outside-click listener after the open transition completes
    pub fn arm_outside_click(&mut self) {
        self.outside_click_armed = true;
    }

    /// Whether a pointer interaction should close this panel
    pub fn closes_on_click(&self, inside_panel: bool, inside_anchor: bool) -> bool {
        self.outside_click_armed && !inside_panel && !inside_anchor
    }

    /// Take the pending input for a send. Empty (after trimming) input is a
    /// no-op and returns `None`.
    pub fn take_input(&mut self) -> Option<String> {
        if self.input.disabled {
            return None;
        }
        let trimmed = self.input.text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let text = trimmed.to_string();
        self.input.text.clear();
        Some(text)
    }

    /// Disable the input for the duration of a round trip
    pub fn begin_round_trip(&mut self) {
        self.input.disabled = true;
        self.input.focused = false;
    }

    /// Re-enable the input and restore focus after the round trip
    pub fn end_round_trip(&mut self) {
        self.input.disabled = false;
        self.input.focused = true;
    }

    pub fn copy_feedback(&self) -> CopyFeedback {
        self.copy_feedback
    }

    pub fn set_copy_feedback(&mut self, feedback: CopyFeedback) {
        self.copy_feedback = feedback;
    }

    /// Reset the copy control label (host calls this after its feedback
    /// interval elapses)
    pub fn reset_copy_feedback(&mut self) {
        self.copy_feedback = CopyFeedback::Idle;
    }
}

/// Confirmation seam for destructive panel actions (clear history)
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Clipboard seam for copy-export
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_click_ignored_until_armed() {
        let panel = Panel::new(BubbleId::new());
        // The opening click lands outside before the transition completes
        assert!(!panel.closes_on_click(false, false));
    }

    #[test]
    fn test_outside_click_closes_after_arming() {
        let mut panel = Panel::new(BubbleId::new());
        panel.arm_outside_click();
        assert!(panel.closes_on_click(false, false));
        // Clicks on the panel or its anchor never close it
        assert!(!panel.closes_on_click(true, false));
        assert!(!panel.closes_on_click(false, true));
    }

    #[test]
    fn test_take_input_trims_and_clears() {
        let mut panel = Panel::new(BubbleId::new());
        panel.input_mut().set_text("  more please  ");
        assert_eq!(panel.take_input().as_deref(), Some("more please"));
        assert!(panel.input().text().is_empty());
    }

    #[test]
    fn test_take_input_empty_is_noop() {
        let mut panel = Panel::new(BubbleId::new());
        panel.input_mut().set_text("   ");
        assert!(panel.take_input().is_none());
    }

    #[test]
    fn test_take_input_blocked_while_disabled() {
        let mut panel = Panel::new(BubbleId::new());
        panel.input_mut().set_text("queued");
        panel.begin_round_trip();
        assert!(panel.take_input().is_none());
    }

    #[test]
    fn test_round_trip_disables_then_restores_focus() {
        let mut panel = Panel::new(BubbleId::new());
        assert!(panel.input().is_focused());

        panel.begin_round_trip();
        assert!(panel.input().is_disabled());
        assert!(!panel.input().is_focused());

        panel.end_round_trip();
        assert!(!panel.input().is_disabled());
        assert!(panel.input().is_focused());
    }

    #[test]
    fn test_copy_feedback_labels() {
        assert_eq!(CopyFeedback::Idle.label(), "Copy All");
        assert_eq!(CopyFeedback::Copied.label(), "Copied!");
        assert_eq!(CopyFeedback::Failed.label(), "Copy failed");
    }
}
