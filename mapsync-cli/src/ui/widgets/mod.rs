//! Map screen widgets.

mod map_canvas;
mod search_field;
mod status;
mod suggestions;

pub use map_canvas::MapCanvas;
pub use search_field::SearchField;
pub use status::StatusBar;
pub use suggestions::SuggestionList;
