//! Events that can occur in a conversation

/// Inbound events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Explicit start command; always (re)initializes the session
    Begin,
    /// Free-form text, either typed or sent from a quick-reply menu
    Message { text: String },
}

impl Event {
    pub fn message(text: impl Into<String>) -> Self {
        Event::Message { text: text.into() }
    }
}
