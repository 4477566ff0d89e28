//! glint-tui: Terminal rendering components for the glint overlay
//!
//! A lightweight projection layer built on ratatui and crossterm. Holds no
//! overlay state of its own: hosts feed it view models derived from the
//! overlay controller.

pub mod app;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::{Host, HostState};
pub use input::{Action, Pointer, PointerKind, UiEvent};
pub use theme::Theme;
