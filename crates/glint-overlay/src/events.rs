//! Overlay events emitted by the controller for hosts to render from

use tokio::sync::broadcast;

use crate::bubble::BubbleId;
use crate::capture::Rect;

/// Events describing overlay state changes. Hosts subscribe and project
/// these into whatever surface they draw on; the controller never renders.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// The ambient menu appeared at a point, optionally with a capture
    /// preview attached
    MenuShown { x: f64, y: f64, has_preview: bool },
    /// The ambient menu was dismissed
    MenuHidden,
    /// A right-click drag began growing a region
    RegionStarted { x: f64, y: f64 },
    /// The live region rectangle changed
    RegionChanged { region: Rect },
    /// The drag finished; the live rectangle must be removed on every
    /// finish path, including failures
    RegionEnded,
    /// A bubble was placed on the page in loading state
    BubbleCreated { id: BubbleId, x: f64, y: f64 },
    /// A bubble's conversation or state changed
    BubbleUpdated { id: BubbleId },
    /// A bubble was removed
    BubbleRemoved { id: BubbleId },
    /// The conversation panel opened over a bubble
    PanelOpened { bubble: BubbleId },
    /// The conversation panel closed
    PanelClosed,
    /// The known auth state changed
    AuthChanged { authenticated: bool },
    /// An auth-related failure; the host should surface a sign-in prompt
    AuthPromptRequested,
}

/// Broadcast sender for overlay events. Emission never fails: an event
/// with no live subscribers is simply dropped.
#[derive(Clone)]
pub struct EventSender {
    tx: broadcast::Sender<OverlayEvent>,
}

impl EventSender {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: OverlayEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_events() {
        let sender = EventSender::new(8);
        let mut rx = sender.subscribe();

        sender.emit(OverlayEvent::MenuShown {
            x: 10.0,
            y: 20.0,
            has_preview: false,
        });
        sender.emit(OverlayEvent::MenuHidden);

        assert_eq!(
            rx.recv().await.unwrap(),
            OverlayEvent::MenuShown {
                x: 10.0,
                y: 20.0,
                has_preview: false
            }
        );
        assert_eq!(rx.recv().await.unwrap(), OverlayEvent::MenuHidden);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let sender = EventSender::new(8);
        sender.emit(OverlayEvent::PanelClosed);
    }
}
