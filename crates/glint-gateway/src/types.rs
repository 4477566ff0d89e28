//! Core types shared between the overlay and the background gateway

use serde::{Deserialize, Serialize};

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Role name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Label shown to the user in transcripts and panels
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "AI",
            Role::System => "System",
        }
    }
}

/// Content blocks in messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Text content
    Text { text: String },
    /// Image content as a typed URL reference (data URL or remote)
    Image { url: String },
}

impl Content {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image reference
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image { url: url.into() }
    }

    /// Get text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Check if this is an image reference
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// One conversation turn. Immutable once appended to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<Content>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![Content::text(text)],
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a user message carrying only an image reference
    pub fn user_image(url: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![Content::image(url)],
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create an assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![Content::text(text)],
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a system instruction message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![Content::text(text)],
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Get combined text content
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Check if any content block is an image reference
    pub fn has_image(&self) -> bool {
        self.content.iter().any(|c| c.is_image())
    }

    /// Short `HH:MM` label for panel rendering
    pub fn time_label(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

/// Per-user settings held by the record store. Read-only from the
/// overlay's perspective; fetched once per session and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Default model identifier
    pub default_model: String,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Whether finished exchanges are mirrored to the record store
    pub auto_save: bool,
    /// Retention count; 0 disables pruning
    pub max_history: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            auto_save: true,
            max_history: 50,
        }
    }
}

/// A signed-in identity as reported by the auth collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Result of a `checkAuthState` round trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
}

impl AuthState {
    /// A signed-out state
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }

    /// A signed-in state
    pub fn signed_in(user: AuthUser) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
        }
    }
}

/// On-page anchor coordinates for a persisted conversation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// The persisted record shape handed to the external record store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub conversation: Vec<ChatMessage>,
    pub page_url: String,
    pub page_title: String,
    pub domain: String,
    pub coordinates: Coordinates,
    /// RFC 3339 timestamp stamped at save time
    pub timestamp: String,
    /// First-prompt preview, stamped by the background service on save
    #[serde(default)]
    pub summary: String,
}

impl ConversationRecord {
    /// Derive the stored summary from the first message, truncated the way
    /// the record store displays it.
    pub fn summarize(&self) -> String {
        match self.conversation.first() {
            Some(first) => {
                let text = first.text();
                let head: String = text.chars().take(100).collect();
                if text.chars().count() > 100 {
                    format!("{}...", head)
                } else {
                    head
                }
            }
            None => "Conversation".to_string(),
        }
    }
}

/// A stored record plus its store-assigned identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConversation {
    pub id: String,
    #[serde(flatten)]
    pub record: ConversationRecord,
}
