//! In-page overlay core: capture, prompt composition, bubbles, the
//! conversation panel, and the controller that drives them.
//!
//! Everything here is headless. Hosts embed [`OverlayController`], feed it
//! interactions, and render from the [`OverlayEvent`] stream; the gateway
//! side of the system lives in `glint-gateway`.

pub mod bubble;
pub mod capture;
pub mod composer;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod events;
pub mod panel;
pub mod persistence;

pub use bubble::{Bubble, BubbleId, BubbleSet, BubbleState};
pub use capture::{
    Capture, MIN_CAPTURE_EXTENT, PageRenderer, Rect, RegionTracker, crop_region,
};
pub use composer::{PromptField, enter_submits};
pub use controller::OverlayController;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use events::{EventSender, OverlayEvent};
pub use panel::{Clipboard, Confirm, CopyFeedback, Panel, PanelInput};
pub use persistence::{PageInfo, record_for, save_bubble};
