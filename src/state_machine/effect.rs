//! Effects produced by state transitions

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask a question, optionally offering quick-reply labels
    SendPrompt {
        text: &'static str,
        menu: Vec<&'static str>,
    },

    /// Plain text reply with no menu (summaries, recipes, greetings)
    SendText { text: String },

    /// Store the new session
    PersistSession,

    /// Remove the session from the store
    DeleteSession,
}

impl Effect {
    pub fn send_text(text: impl Into<String>) -> Self {
        Effect::SendText { text: text.into() }
    }

    pub fn send_prompt(text: &'static str, menu: Vec<&'static str>) -> Self {
        Effect::SendPrompt { text, menu }
    }
}
