//! The shared query/address text.

use serde::Serialize;

/// Who the address text currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AddressMode {
    /// The user is typing; the text drives autocomplete.
    #[default]
    Query,
    /// The text shows a resolved address and drives nothing.
    Display,
}

/// Text that doubles as the search query and the resolved address display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AddressText {
    text: String,
    mode: AddressMode,
}

impl AddressText {
    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current mode.
    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    /// Whether the text is a user query.
    pub fn is_query(&self) -> bool {
        self.mode == AddressMode::Query
    }

    /// Whether `text` is just the displayed address coming back unchanged,
    /// e.g. a text field echoing what it was given.
    pub fn is_echo(&self, text: &str) -> bool {
        self.mode == AddressMode::Display && self.text == text
    }

    pub(crate) fn set_query(&mut self, text: String) {
        self.text = text;
        self.mode = AddressMode::Query;
    }

    pub(crate) fn set_display(&mut self, text: String) {
        self.text = text;
        self.mode = AddressMode::Display;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_query() {
        let address = AddressText::default();
        assert_eq!(address.text(), "");
        assert!(address.is_query());
    }

    #[test]
    fn test_echo_only_in_display_mode() {
        let mut address = AddressText::default();
        address.set_query("Main St".to_string());
        assert!(!address.is_echo("Main St"));

        address.set_display("Main St".to_string());
        assert!(address.is_echo("Main St"));
        assert!(!address.is_echo("Main St 1"));
    }
}
