//! Conversation controller: the transcript, the draft, and the in-flight flag.
//!
//! A submit appends exactly one user message and then exactly one assistant
//! message. Backend failures never escape; they become a fixed apology in the
//! transcript. A submit while a request is pending, or with a blank prompt, is
//! rejected before anything changes.

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, Backend};
use crate::recommendation::Recommendation;
use crate::state::Message;

pub const GREETING: &str = "Hello! Tell me what kind of furniture you're looking for (e.g., a leather sofa for a minimalist living room).";

pub const UNAVAILABLE_MESSAGE: &str = "Sorry, the AI recommendation engine is currently unavailable. Please ensure the backend is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("a request is already in flight")]
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
    draft: String,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant_text(GREETING)],
            pending: false,
            draft: String::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn state(&self) -> ConversationState {
        if self.pending {
            ConversationState::AwaitingResponse
        } else {
            ConversationState::Idle
        }
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Record the user's turn and mark the conversation as waiting.
    ///
    /// Returns the trimmed prompt to send to the backend.
    pub fn begin_submit(&mut self, prompt: &str) -> Result<String, SubmitError> {
        if self.pending {
            return Err(SubmitError::Pending);
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }

        self.messages.push(Message::user(prompt));
        self.pending = true;
        Ok(prompt.to_string())
    }

    /// Record the backend's answer (or the apology) and return to idle
    pub fn complete(&mut self, outcome: Result<Vec<Recommendation>, ApiError>) {
        let reply = match outcome {
            Ok(recommendations) => {
                debug!(count = recommendations.len(), "recommendations appended");
                Message::assistant_recommendations(recommendations)
            }
            Err(e) => {
                warn!(error = %e, "recommendation request failed");
                Message::assistant_text(UNAVAILABLE_MESSAGE)
            }
        };

        self.messages.push(reply);
        self.draft.clear();
        self.pending = false;
    }

    pub async fn submit<B: Backend + ?Sized>(&mut self, backend: &B, prompt: &str) -> Result<(), SubmitError> {
        let prompt = self.begin_submit(prompt)?;
        let outcome = backend.recommend(&prompt).await;
        self.complete(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsSnapshot;
    use crate::state::{MessageContent, Sender};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeBackend {
        reply: Option<Vec<Recommendation>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn ok(reply: Vec<Recommendation>) -> Self {
            Self { reply: Some(reply), calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { reply: None, calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn recommend(&self, prompt: &str) -> Result<Vec<Recommendation>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(r) => Ok(r.clone()),
                None => Err(ApiError::Decode(serde_json::from_str::<u8>("x").unwrap_err())),
            }
        }

        async fn analytics(&self) -> Result<AnalyticsSnapshot, ApiError> {
            Err(ApiError::Decode(serde_json::from_str::<u8>("x").unwrap_err()))
        }
    }

    fn sofa() -> Recommendation {
        serde_json::from_str(
            r#"{"title": "Leather Sofa", "price": "$1,299.00", "image_url": "['http://a.png']", "creative_description": "Classic."}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_new_conversation_is_seeded() {
        let convo = Conversation::new();
        assert_eq!(convo.messages(), &[Message::assistant_text(GREETING)]);
        assert_eq!(convo.state(), ConversationState::Idle);
        assert_eq!(convo.draft(), "");
    }

    #[tokio::test]
    async fn test_submit_success_appends_two_messages() {
        let backend = FakeBackend::ok(vec![sofa()]);
        let mut convo = Conversation::new();
        convo.update_draft("  leather sofa ");

        convo.submit(&backend, "  leather sofa ").await.unwrap();

        let messages = convo.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("leather sofa"));
        assert_eq!(messages[2].sender, Sender::Assistant);
        assert_eq!(messages[2].content, MessageContent::Recommendations(vec![sofa()]));
        assert_eq!(backend.prompts.lock().unwrap().as_slice(), &["leather sofa".to_string()]);
        assert!(!convo.is_pending());
        assert_eq!(convo.draft(), "");
    }

    #[tokio::test]
    async fn test_submit_failure_appends_fallback() {
        let backend = FakeBackend::failing();
        let mut convo = Conversation::new();

        convo.submit(&backend, "oak table").await.unwrap();

        let messages = convo.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[2], Message::assistant_text(UNAVAILABLE_MESSAGE));
        assert_eq!(convo.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_empty_recommendations_are_not_a_failure() {
        let backend = FakeBackend::ok(Vec::new());
        let mut convo = Conversation::new();

        convo.submit(&backend, "leather sofa").await.unwrap();

        assert_eq!(convo.messages()[2].content, MessageContent::Recommendations(Vec::new()));
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected_without_effect() {
        let backend = FakeBackend::ok(vec![sofa()]);
        let mut convo = Conversation::new();
        convo.update_draft("   ");

        assert_eq!(convo.submit(&backend, "   ").await, Err(SubmitError::EmptyPrompt));
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.draft(), "   ");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_while_pending_has_no_effect() {
        let backend = FakeBackend::ok(vec![sofa()]);
        let mut convo = Conversation::new();

        let prompt = convo.begin_submit("first").unwrap();
        assert_eq!(prompt, "first");
        assert_eq!(convo.state(), ConversationState::AwaitingResponse);
        let before = convo.messages().to_vec();

        assert_eq!(convo.submit(&backend, "second").await, Err(SubmitError::Pending));
        assert_eq!(convo.messages(), before.as_slice());
        assert!(convo.is_pending());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_complete_always_returns_to_idle() {
        let mut convo = Conversation::new();
        convo.update_draft("chair");
        convo.begin_submit("chair").unwrap();

        convo.complete(Err(ApiError::Decode(serde_json::from_str::<u8>("x").unwrap_err())));

        assert_eq!(convo.state(), ConversationState::Idle);
        assert_eq!(convo.draft(), "");
        assert!(convo.begin_submit("another chair").is_ok());
    }
}
