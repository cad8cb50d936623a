//! The transport boundary contract.
//!
//! A transport hands the core a plain text message plus a caller identity,
//! and gets back a plain text response plus a named keyboard layout. The
//! transport decides how to render the keyboard and the inline-emphasis
//! markup (a minimal subset: `<b>` bold spans).

use serde::{Deserialize, Serialize};

/// Opaque caller identity, platform-specific.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inbound chat message as seen by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inbound {
    /// Who sent this message
    pub caller_id: CallerId,

    /// Human-readable sender name (if the platform provides one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,

    /// The text content
    pub text: String,
}

impl Inbound {
    pub fn new(caller_id: CallerId, caller_name: Option<String>, text: impl Into<String>) -> Self {
        Self {
            caller_id,
            caller_name,
            text: text.into(),
        }
    }
}

/// Named keyboard layouts the transport renders into concrete UI controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyboard {
    /// Regular caller main menu: start, suggest-word
    Main,
    /// Privileged caller main menu: start, add, suggestions, contacts
    AdminMain,
    /// Suggestions sub-menu: index operations plus back
    SuggestionsMenu,
    /// A single cancel button (bulk add in progress)
    CancelOnly,
    /// A single back button (list views and the suggestion flow)
    BackOnly,
}

/// The response descriptor handed back to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// The text content
    pub text: String,

    /// Which keyboard the transport should render alongside the text
    pub keyboard: Keyboard,

    /// Whether `text` contains `<b>` bold spans the transport must render
    pub formatted: bool,
}

impl Reply {
    /// A plain-text reply with no markup.
    pub fn plain(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            formatted: false,
        }
    }

    /// A reply carrying `<b>` bold spans.
    pub fn formatted(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            formatted: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reply_is_unformatted() {
        let reply = Reply::plain("hello", Keyboard::Main);
        assert!(!reply.formatted);
        assert_eq!(reply.keyboard, Keyboard::Main);
    }

    #[test]
    fn formatted_reply_flags_markup() {
        let reply = Reply::formatted("<b>hello</b>", Keyboard::BackOnly);
        assert!(reply.formatted);
    }

    #[test]
    fn keyboard_serializes_snake_case() {
        let json = serde_json::to_string(&Keyboard::SuggestionsMenu).unwrap();
        assert_eq!(json, "\"suggestions_menu\"");
    }
}
