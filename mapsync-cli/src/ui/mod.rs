//! Terminal UI for the interactive map demo.

mod screen;
pub mod widgets;

pub use screen::{MapScreen, ScreenEvent, ScreenLayout, ScreenView};
