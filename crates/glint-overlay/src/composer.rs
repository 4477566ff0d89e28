//! Prompt composer: turns a capture into the text of the editable field

/// Default instruction when a screenshot is attached and the field is empty
const SCREENSHOT_DEFAULT_PROMPT: &str = "Analyze this screenshot and explain what you see.";

/// The editable prompt field inside the ambient menu
#[derive(Debug, Default)]
pub struct PromptField {
    text: String,
}

impl PromptField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current field text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the field text (direct typing)
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Seed the field from a text selection: a fresh field asks for an
    /// explanation; a non-empty field gets the selection appended.
    pub fn populate_selection(&mut self, selection: &str) {
        let current = self.text.trim();
        if current.is_empty() {
            self.text = format!("Explain this text: \"{}\"", selection);
        } else {
            self.text = format!("{}\n\nSelected text: \"{}\"", current, selection);
        }
    }

    /// If the field is still empty after composing an image capture, fill
    /// it with the generic screenshot instruction.
    pub fn apply_screenshot_default(&mut self) {
        if self.is_empty() {
            self.text = SCREENSHOT_DEFAULT_PROMPT.to_string();
        }
    }

    /// Take the submission, trimming whitespace. Empty submissions are a
    /// no-op and leave the field untouched.
    pub fn take_submission(&mut self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let submission = trimmed.to_string();
        self.text.clear();
        Some(submission)
    }

    /// Discard the field contents (menu dismissed)
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

/// Whether an Enter keypress submits: only without a held modifier
pub fn enter_submits(modifier_held: bool) -> bool {
    !modifier_held
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_field_explains_selection() {
        let mut field = PromptField::new();
        field.populate_selection("lorem ipsum");
        assert_eq!(field.text(), "Explain this text: \"lorem ipsum\"");
    }

    #[test]
    fn test_nonempty_field_appends_selection() {
        let mut field = PromptField::new();
        field.set_text("What does this mean?");
        field.populate_selection("dolor sit");
        assert_eq!(
            field.text(),
            "What does this mean?\n\nSelected text: \"dolor sit\""
        );
    }

    #[test]
    fn test_whitespace_only_field_counts_as_fresh() {
        let mut field = PromptField::new();
        field.set_text("   ");
        field.populate_selection("amet");
        assert_eq!(field.text(), "Explain this text: \"amet\"");
    }

    #[test]
    fn test_screenshot_default_only_fills_empty_field() {
        let mut field = PromptField::new();
        field.apply_screenshot_default();
        assert_eq!(field.text(), SCREENSHOT_DEFAULT_PROMPT);

        let mut field = PromptField::new();
        field.set_text("Describe the chart");
        field.apply_screenshot_default();
        assert_eq!(field.text(), "Describe the chart");
    }

    #[test]
    fn test_empty_submission_is_noop() {
        let mut field = PromptField::new();
        field.set_text("  \n ");
        assert!(field.take_submission().is_none());
    }

    #[test]
    fn test_submission_trims_and_clears() {
        let mut field = PromptField::new();
        field.set_text("  Summarize this  ");
        assert_eq!(field.take_submission().as_deref(), Some("Summarize this"));
        assert!(field.is_empty());
    }

    #[test]
    fn test_enter_submits_without_modifier() {
        assert!(enter_submits(false));
        assert!(!enter_submits(true));
    }
}
