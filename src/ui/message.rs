/// Label shown next to a message in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "AI",
        }
    }
}

pub const TYPING_TEXT: &str = "Typing...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub is_typing: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            is_typing: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            is_typing: false,
        }
    }

    pub fn typing() -> Self {
        Self {
            sender: Sender::Assistant,
            text: TYPING_TEXT.to_string(),
            is_typing: true,
        }
    }

    /// Content split on newlines; each item renders as its own line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// Ordered in-memory message list for one UI session. Nothing here is
/// persisted; the transcript lives and dies with the page.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends the typing-indicator placeholder. At most one exists at a
    /// time, so any stale one is dropped first.
    pub fn begin_typing(&mut self) -> ChatMessage {
        self.end_typing();
        let indicator = ChatMessage::typing();
        self.messages.push(indicator.clone());
        indicator
    }

    /// Removes the placeholder. Messages are never mutated in place; the
    /// real reply arrives as a fresh append.
    pub fn end_typing(&mut self) {
        self.messages.retain(|message| !message.is_typing);
    }

    pub fn is_typing(&self) -> bool {
        self.messages.iter().any(|message| message.is_typing)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
