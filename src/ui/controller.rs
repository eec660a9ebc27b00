use tokio_util::sync::CancellationToken;
use tracing::error;

use super::message::{ChatMessage, Transcript};
use super::relay_client::{RelayClient, RelayError};

pub const FAILURE_TEXT: &str = "Sorry, I'm having trouble connecting to the server.";

/// The page elements the controller touches, reduced to the operations it
/// actually needs: read/clear the input, append to the log, keep the log
/// scrolled to the newest entry.
pub trait ChatView {
    fn input_value(&self) -> String;
    fn clear_input(&mut self);
    fn append_message(&mut self, message: &ChatMessage);
    fn remove_typing_indicator(&mut self);
    fn scroll_to_bottom(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Submit,
    InsertNewline,
    PassThrough,
}

/// Enter alone submits; Shift+Enter inserts a literal newline; everything
/// else is left to the input's default handling.
pub fn key_action(press: KeyPress) -> InputAction {
    match press {
        KeyPress {
            key: Key::Enter,
            shift: false,
        } => InputAction::Submit,
        KeyPress {
            key: Key::Enter,
            shift: true,
        } => InputAction::InsertNewline,
        _ => InputAction::PassThrough,
    }
}

pub struct ChatController<C> {
    relay: C,
    transcript: Transcript,
}

impl<C: RelayClient> ChatController<C> {
    pub fn new(relay: C) -> Self {
        Self {
            relay,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Handles one submit action end to end: user message in, typing
    /// indicator up, one relay call, reply (or failure text) out.
    ///
    /// The typing indicator is removed on every exit path. An aborted call
    /// appends nothing and surfaces `RelayError::Aborted` to the caller;
    /// every other failure becomes a generic assistant-side message.
    pub async fn submit(
        &mut self,
        view: &mut impl ChatView,
        cancel: &CancellationToken,
    ) -> Result<(), RelayError> {
        let raw = view.input_value();
        let text = raw.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.append(view, ChatMessage::user(text));
        view.clear_input();

        let indicator = self.transcript.begin_typing();
        view.append_message(&indicator);
        view.scroll_to_bottom();

        let result = self.relay.send(text, cancel).await;

        self.transcript.end_typing();
        view.remove_typing_indicator();

        match result {
            Ok(reply) => {
                self.append(view, ChatMessage::assistant(reply));
                Ok(())
            }
            Err(RelayError::Aborted) => Err(RelayError::Aborted),
            Err(err) => {
                error!("relay call failed: {err}");
                self.append(view, ChatMessage::assistant(FAILURE_TEXT));
                Ok(())
            }
        }
    }

    fn append(&mut self, view: &mut impl ChatView, message: ChatMessage) {
        view.append_message(&message);
        view.scroll_to_bottom();
        self.transcript.push(message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::super::message::{ChatMessage, Sender};
    use super::super::relay_client::{RelayClient, RelayError};
    use super::{key_action, ChatController, ChatView, InputAction, Key, KeyPress, FAILURE_TEXT};

    struct ScriptedRelay {
        replies: Mutex<Vec<Result<String, RelayError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedRelay {
        fn new(replies: Vec<Result<String, RelayError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RelayClient for &ScriptedRelay {
        async fn send(
            &self,
            _message: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[derive(Default)]
    struct FakeView {
        input: String,
        log: Vec<ChatMessage>,
        rendered: Vec<Vec<String>>,
        scrolls: usize,
    }

    impl ChatView for FakeView {
        fn input_value(&self) -> String {
            self.input.clone()
        }

        fn clear_input(&mut self) {
            self.input.clear();
        }

        fn append_message(&mut self, message: &ChatMessage) {
            self.rendered
                .push(message.lines().map(str::to_string).collect());
            self.log.push(message.clone());
        }

        fn remove_typing_indicator(&mut self) {
            self.log.retain(|message| !message.is_typing);
        }

        fn scroll_to_bottom(&mut self) {
            self.scrolls += 1;
        }
    }

    fn view_with_input(input: &str) -> FakeView {
        FakeView {
            input: input.to_string(),
            ..FakeView::default()
        }
    }

    #[tokio::test]
    async fn submit_shows_user_message_then_reply() {
        let relay = ScriptedRelay::new(vec![Ok("Hi there".to_string())]);
        let mut controller = ChatController::new(&relay);
        let mut view = view_with_input("Hello");

        controller
            .submit(&mut view, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(relay.call_count(), 1);
        assert!(view.input.is_empty());
        // the indicator was appended mid-flight and removed afterwards
        assert_eq!(view.log.len(), 2);
        assert_eq!(view.log[0].sender, Sender::User);
        assert_eq!(view.log[0].text, "Hello");
        assert_eq!(view.log[1].sender, Sender::Assistant);
        assert_eq!(view.log[1].text, "Hi there");
        assert!(!controller.transcript().is_typing());
        assert!(view.scrolls >= 3);
    }

    #[tokio::test]
    async fn multi_line_reply_renders_as_separate_lines() {
        let relay = ScriptedRelay::new(vec![Ok("first line\nsecond line".to_string())]);
        let mut controller = ChatController::new(&relay);
        let mut view = view_with_input("Hello");

        controller
            .submit(&mut view, &CancellationToken::new())
            .await
            .unwrap();

        let reply_lines = view.rendered.last().unwrap();
        assert_eq!(reply_lines, &["first line", "second line"]);
    }

    #[tokio::test]
    async fn whitespace_only_input_is_a_no_op() {
        let relay = ScriptedRelay::new(vec![]);
        let mut controller = ChatController::new(&relay);
        let mut view = view_with_input("   \n  ");

        controller
            .submit(&mut view, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(relay.call_count(), 0);
        assert!(view.log.is_empty());
        assert!(controller.transcript().messages().is_empty());
    }

    #[tokio::test]
    async fn failure_appends_generic_message_and_clears_indicator() {
        let relay = ScriptedRelay::new(vec![Err(RelayError::Endpoint {
            status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            message: "Server configuration error.".to_string(),
        })]);
        let mut controller = ChatController::new(&relay);
        let mut view = view_with_input("Hello");

        controller
            .submit(&mut view, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(view.log.len(), 2);
        assert_eq!(view.log[1].text, FAILURE_TEXT);
        assert!(!controller.transcript().is_typing());
    }

    #[tokio::test]
    async fn abort_propagates_and_appends_nothing() {
        let relay = ScriptedRelay::new(vec![Err(RelayError::Aborted)]);
        let mut controller = ChatController::new(&relay);
        let mut view = view_with_input("Hello");

        let err = controller
            .submit(&mut view, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_aborted());
        // only the user message remains; no generic failure text
        assert_eq!(view.log.len(), 1);
        assert_eq!(view.log[0].sender, Sender::User);
        assert!(!controller.transcript().is_typing());
    }

    #[test]
    fn enter_submits_and_shift_enter_inserts_newline() {
        assert_eq!(
            key_action(KeyPress {
                key: Key::Enter,
                shift: false
            }),
            InputAction::Submit
        );
        assert_eq!(
            key_action(KeyPress {
                key: Key::Enter,
                shift: true
            }),
            InputAction::InsertNewline
        );
        assert_eq!(
            key_action(KeyPress {
                key: Key::Other,
                shift: false
            }),
            InputAction::PassThrough
        );
    }
}
