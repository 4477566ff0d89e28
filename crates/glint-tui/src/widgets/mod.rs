//! Custom widgets for overlay surfaces

pub mod marker;
pub mod panel_view;
pub mod prompt_input;

pub use marker::BubbleMarker;
pub use panel_view::{PanelMessage, PanelView};
pub use prompt_input::PromptInput;
