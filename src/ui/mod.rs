mod controller;
mod message;
mod relay_client;

pub use controller::{
    key_action, ChatController, ChatView, InputAction, Key, KeyPress, FAILURE_TEXT,
};
pub use message::{ChatMessage, Sender, Transcript, TYPING_TEXT};
pub use relay_client::{HttpRelayClient, RelayClient, RelayError};
