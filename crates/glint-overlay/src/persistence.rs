//! Persistence adapter: mirrors finished exchanges to the record store.
//!
//! Saving is strictly best-effort. A failure is logged and swallowed; it
//! never surfaces in the conversation or blocks the next turn.

use chrono::Utc;
use glint_gateway::{Coordinates, ConversationRecord, GatewayClient};

use crate::bubble::Bubble;

/// Identity of the hosting page, captured once at controller construction
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
    pub domain: String,
}

impl PageInfo {
    pub fn new(url: impl Into<String>, title: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            domain: domain.into(),
        }
    }
}

/// Build the record for a bubble's conversation as it stands right now
pub fn record_for(bubble: &Bubble, page: &PageInfo) -> ConversationRecord {
    let (x, y) = bubble.position();
    ConversationRecord {
        conversation: bubble.conversation().messages().to_vec(),
        page_url: page.url.clone(),
        page_title: page.title.clone(),
        domain: page.domain.clone(),
        coordinates: Coordinates { x, y },
        timestamp: Utc::now().to_rfc3339(),
        summary: String::new(),
    }
}

/// Mirror a bubble's conversation to the record store, swallowing failure
pub async fn save_bubble(gateway: &GatewayClient, bubble: &Bubble, page: &PageInfo) {
    let record = record_for(bubble, page);
    match gateway.save_conversation(record).await {
        Ok(id) => tracing::debug!(%id, bubble = %bubble.id(), "conversation saved"),
        Err(err) => tracing::warn!(%err, bubble = %bubble.id(), "conversation save failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_captures_page_and_position() {
        let bubble = Bubble::new(42.0, 84.0, "what is this?");
        let page = PageInfo::new("https://example.com/a", "Example A", "example.com");

        let record = record_for(&bubble, &page);
        assert_eq!(record.page_url, "https://example.com/a");
        assert_eq!(record.domain, "example.com");
        assert_eq!(record.coordinates, Coordinates { x: 42.0, y: 84.0 });
        assert_eq!(record.conversation.len(), 1);
        // Summary is stamped by the background service, not here
        assert!(record.summary.is_empty());
        assert!(!record.timestamp.is_empty());
    }
}
