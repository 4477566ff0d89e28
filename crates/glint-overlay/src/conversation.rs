//! Conversation state: an ordered, append-only message sequence scoped to
//! one bubble.

use glint_gateway::{ChatMessage, Role};

/// Append-only message history. The first message is always the initiating
/// user prompt; clearing truncates back to it, never to zero.
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create a conversation from the initiating prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true: a conversation always holds at least the first prompt
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The initiating prompt text
    pub fn first_prompt(&self) -> String {
        self.messages[0].text()
    }

    /// Append a user turn
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(text));
    }

    /// Truncate history back to the initiating prompt
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }

    /// Role-prefixed transcript for copy-export: one blank-line-separated
    /// segment per message.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.text()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The outbound sequence for a gateway round trip: the fixed system
    /// instruction first, then the full history in append order.
    pub fn to_outbound(&self, system_instruction: &str) -> Vec<ChatMessage> {
        let mut outbound = Vec::with_capacity(self.messages.len() + 1);
        outbound.push(ChatMessage::system(system_instruction));
        outbound.extend(self.messages.iter().cloned());
        outbound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_single_user_message() {
        let conv = Conversation::new("Summarize this");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].role, Role::User);
        assert_eq!(conv.messages()[0].text(), "Summarize this");
    }

    #[test]
    fn test_clear_truncates_to_first_message_only() {
        let mut conv = Conversation::new("first");
        conv.push_assistant("reply one");
        conv.push_user("follow up");
        conv.push_assistant("reply two");
        assert_eq!(conv.len(), 4);

        conv.clear();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.first_prompt(), "first");

        // Clearing again is idempotent, never reaches zero
        conv.clear();
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_transcript_one_segment_per_message() {
        let mut conv = Conversation::new("hello");
        conv.push_assistant("hi there");
        conv.push_user("and then?");

        let transcript = conv.transcript();
        let segments: Vec<&str> = transcript.split("\n\n").collect();
        assert_eq!(segments.len(), conv.len());
        assert_eq!(segments[0], "You: hello");
        assert_eq!(segments[1], "AI: hi there");
        assert_eq!(segments[2], "You: and then?");
    }

    #[test]
    fn test_outbound_prefixes_system_instruction() {
        let mut conv = Conversation::new("explain");
        conv.push_assistant("sure");

        let outbound = conv.to_outbound("You are a helpful assistant.");
        assert_eq!(outbound.len(), 3);
        assert_eq!(outbound[0].role, Role::System);
        assert_eq!(outbound[0].text(), "You are a helpful assistant.");
        assert_eq!(outbound[1].text(), "explain");
        assert_eq!(outbound[2].role, Role::Assistant);
    }
}
