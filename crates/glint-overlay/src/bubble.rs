//! Conversation bubbles: on-page anchors, one per submitted exchange

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::Conversation;

/// Identifier for one on-page bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BubbleId(Uuid);

impl BubbleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BubbleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BubbleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bubble-{}", self.0)
    }
}

/// Bubble lifecycle. The only transition is `Loading -> Ready`, taken on
/// both success and failure; an error reply is an assistant message, not a
/// distinct state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleState {
    Loading,
    Ready,
}

/// One on-page conversational anchor
pub struct Bubble {
    id: BubbleId,
    x: f64,
    y: f64,
    conversation: Conversation,
    state: BubbleState,
}

impl Bubble {
    /// Create a bubble in loading state holding only the submitted prompt
    pub fn new(x: f64, y: f64, prompt: impl Into<String>) -> Self {
        Self {
            id: BubbleId::new(),
            x,
            y,
            conversation: Conversation::new(prompt),
            state: BubbleState::Loading,
        }
    }

    pub fn id(&self) -> BubbleId {
        self.id
    }

    /// Screen coordinates at creation time
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn state(&self) -> BubbleState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == BubbleState::Loading
    }

    /// Append the assistant reply and move to `Ready`
    pub fn apply_reply(&mut self, reply: &str) {
        self.conversation.push_assistant(reply);
        self.state = BubbleState::Ready;
    }

    /// Append a failure as an `Error: ...` assistant message and move to
    /// `Ready` all the same.
    pub fn apply_failure(&mut self, error_text: &str) {
        self.conversation.push_assistant(error_text);
        self.state = BubbleState::Ready;
    }
}

/// The bubbles alive on one page. Entries persist until the page unloads
/// or the user removes them; ids are never reused.
#[derive(Default)]
pub struct BubbleSet {
    bubbles: Vec<Bubble>,
}

impl BubbleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bubble: Bubble) -> BubbleId {
        let id = bubble.id();
        self.bubbles.push(bubble);
        id
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id() == id)
    }

    pub fn get_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id() == id)
    }

    /// Remove a bubble; returns whether it existed
    pub fn remove(&mut self, id: BubbleId) -> bool {
        let before = self.bubbles.len();
        self.bubbles.retain(|b| b.id() != id);
        self.bubbles.len() != before
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.iter()
    }

    /// Drop every bubble (page unload teardown)
    pub fn clear(&mut self) {
        self.bubbles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_gateway::Role;

    #[test]
    fn test_fresh_bubble_invariants() {
        let bubble = Bubble::new(120.0, 340.0, "Summarize this");
        assert!(bubble.is_loading());
        assert_eq!(bubble.position(), (120.0, 340.0));
        assert_eq!(bubble.conversation().len(), 1);
        let first = &bubble.conversation().messages()[0];
        assert_eq!(first.role, Role::User);
        assert_eq!(first.text(), "Summarize this");
    }

    #[test]
    fn test_reply_transitions_to_ready() {
        let mut bubble = Bubble::new(0.0, 0.0, "Summarize this");
        bubble.apply_reply("It's a test");
        assert_eq!(bubble.state(), BubbleState::Ready);
        assert_eq!(bubble.conversation().len(), 2);
        assert_eq!(bubble.conversation().messages()[1].text(), "It's a test");
    }

    #[test]
    fn test_failure_transitions_to_ready_with_error_message() {
        let mut bubble = Bubble::new(0.0, 0.0, "prompt");
        bubble.apply_failure("Error: Network error: connection refused");
        assert_eq!(bubble.state(), BubbleState::Ready);
        let last = bubble.conversation().messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.text().starts_with("Error:"));
    }

    #[test]
    fn test_set_insert_get_remove() {
        let mut set = BubbleSet::new();
        let id = set.insert(Bubble::new(1.0, 2.0, "a"));
        set.insert(Bubble::new(3.0, 4.0, "b"));
        assert_eq!(set.len(), 2);

        assert!(set.get(id).is_some());
        assert!(set.remove(id));
        assert!(set.get(id).is_none());
        assert!(!set.remove(id));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Bubble::new(0.0, 0.0, "x");
        let b = Bubble::new(0.0, 0.0, "x");
        assert_ne!(a.id(), b.id());
    }
}
