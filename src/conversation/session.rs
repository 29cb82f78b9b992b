//! Conversation session state.

use super::{ChatMessage, ChatModel};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// One completed exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    /// Text actually sent to the model.
    #[serde(skip)]
    pub input: String,
    /// What the user sees as their side of the turn.
    pub label: String,
    /// The model's reply.
    pub reply: String,
    pub at: DateTime<Utc>,
}

/// Ordered turn history plus the chat model that produces replies.
///
/// History is append-only and only grows after a successful completion,
/// so a failed call leaves the session exactly as it was.
pub struct ConversationSession {
    id: Uuid,
    system_prompt: Option<String>,
    turns: Vec<Turn>,
    model: Arc<dyn ChatModel>,
}

impl ConversationSession {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            id: Uuid::new_v4(),
            system_prompt: None,
            turns: Vec::new(),
            model,
        }
    }

    /// Send a system message ahead of every request.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Inputs as displayed, index-aligned with [`generated`](Self::generated).
    pub fn previous(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.label.as_str()).collect()
    }

    /// Replies, index-aligned with [`previous`](Self::previous).
    pub fn generated(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.reply.as_str()).collect()
    }

    /// The most recent reply, if any.
    pub fn last_reply(&self) -> Option<&str> {
        self.turns.last().map(|t| t.reply.as_str())
    }

    /// Send a message and return the reply.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        self.send_labeled(message, message).await
    }

    /// Send `message`, recording `label` as the displayed input.
    #[instrument(skip(self, message), fields(session = %self.id, turn = self.turns.len()))]
    pub async fn send_labeled(&mut self, message: &str, label: &str) -> Result<String> {
        let request = self.request_messages(message);
        debug!("Sending {} messages to {}", request.len(), self.model.model());

        let reply = self.model.complete(&request).await?;

        self.turns.push(Turn {
            input: message.to_string(),
            label: label.to_string(),
            reply: reply.clone(),
            at: Utc::now(),
        });

        Ok(reply)
    }

    /// Drop all history and take a fresh identity.
    pub fn reset(&mut self) {
        let old = self.id;
        self.turns.clear();
        self.id = Uuid::new_v4();
        info!("Session {} reset, new id {}", old, self.id);
    }

    /// Full request for the next turn: system prompt, every prior exchange, then `next`.
    fn request_messages(&self, next: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() * 2 + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        for turn in &self.turns {
            messages.push(ChatMessage::user(turn.input.clone()));
            messages.push(ChatMessage::assistant(turn.reply.clone()));
        }
        messages.push(ChatMessage::user(next));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::error::TubecoachError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with how many prior messages it was given.
    struct HistoryEcho;

    #[async_trait]
    impl ChatModel for HistoryEcho {
        fn model(&self) -> &str {
            "echo"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            Ok(format!("history={}", messages.len() - 1))
        }
    }

    /// Fails every call after the first `ok_calls`.
    struct FailAfter {
        ok_calls: usize,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ChatModel for FailAfter {
        fn model(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls > self.ok_calls {
                Err(TubecoachError::Inference("rate limited".to_string()))
            } else {
                Ok(format!("reply {}", calls))
            }
        }
    }

    #[tokio::test]
    async fn test_history_stays_aligned() {
        let mut session = ConversationSession::new(Arc::new(HistoryEcho));

        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            let reply = session.send(text).await.unwrap();
            assert_eq!(reply, format!("history={}", i * 2));
            assert_eq!(session.previous().len(), session.generated().len());
            assert_eq!(session.previous()[i], *text);
            assert_eq!(session.generated()[i], reply);
        }
    }

    #[tokio::test]
    async fn test_full_history_is_resent() {
        let mut session = ConversationSession::new(Arc::new(HistoryEcho))
            .with_system_prompt(Some("be brief".to_string()));
        session.send("a").await.unwrap();

        let request = session.request_messages("b");
        let roles: Vec<Role> = request.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(request[1].content, "a");
        assert_eq!(request[3].content, "b");
    }

    #[tokio::test]
    async fn test_labeled_send_keeps_real_input_for_model() {
        let mut session = ConversationSession::new(Arc::new(HistoryEcho));
        session
            .send_labeled("long prompt", "File received. Currently reviewing...")
            .await
            .unwrap();

        assert_eq!(session.previous(), vec!["File received. Currently reviewing..."]);
        assert_eq!(session.turns()[0].input, "long prompt");
        assert_eq!(session.request_messages("next")[0].content, "long prompt");
    }

    #[tokio::test]
    async fn test_reset_clears_history_and_identity() {
        let mut session = ConversationSession::new(Arc::new(HistoryEcho));
        session.send("a").await.unwrap();
        session.send("b").await.unwrap();
        let old_id = session.id();

        session.reset();
        assert!(session.is_empty());
        assert_ne!(session.id(), old_id);

        let reply = session.send("fresh").await.unwrap();
        assert_eq!(reply, "history=0");
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_untouched() {
        let mut session = ConversationSession::new(Arc::new(FailAfter {
            ok_calls: 1,
            calls: Mutex::new(0),
        }));

        session.send("ok").await.unwrap();
        let err = session.send("boom").await.unwrap_err();

        assert!(matches!(err, TubecoachError::Inference(_)));
        assert_eq!(session.len(), 1);
        assert_eq!(session.last_reply(), Some("reply 1"));
    }
}
