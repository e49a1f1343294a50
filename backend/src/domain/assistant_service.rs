//! # Help Assistant
//!
//! Chat sessions live in memory only. Each request to the provider carries
//! the fixed system prompt followed by the session history, trimmed to the
//! configured length.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{ChatMessage, ChatReply, ChatRole, ChatSessionResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use super::error::{SchoolError, SchoolResult};
use super::validation::required;
use crate::config::AssistantConfig;

pub const SYSTEM_PROMPT: &str = "You are the help assistant of a school administration console. \
The console manages classes, students, staff, attendance, monthly fees and dues, other fees, salaries, \
transport drivers, exam results, expenses, documents such as ID cards, fee bills and certificates, and \
data export and import. Answer questions about how to use these features in short, practical steps. \
If a question is unrelated to running the school office, say that you can only help with the console.";

/// Anything that can turn a conversation into the next assistant message
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// OpenAI-compatible chat completions over HTTPS
pub struct HttpChatProvider {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl HttpChatProvider {
    pub fn new(config: AssistantConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("no API key configured"))?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&CompletionRequest { model: &self.config.model, messages })
            .send()
            .await
            .context("request to chat provider failed")?
            .error_for_status()
            .context("chat provider returned an error status")?;

        let body: CompletionResponse = response.json().await.context("unreadable chat provider response")?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat provider returned no choices"))
    }
}

struct Session {
    owner_id: String,
    history: Vec<ChatMessage>,
}

#[derive(Clone)]
pub struct AssistantService {
    provider: Arc<dyn ChatProvider>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    max_history: usize,
}

impl AssistantService {
    pub fn new(provider: Arc<dyn ChatProvider>, max_history: usize) -> Self {
        Self {
            provider,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            max_history: max_history.max(1),
        }
    }

    pub async fn create_session(&self, owner_id: &str) -> ChatSessionResponse {
        let session_id = format!("chat::{}", Uuid::new_v4());
        self.sessions.lock().await.insert(
            session_id.clone(),
            Session { owner_id: owner_id.to_string(), history: Vec::new() },
        );
        info!("Opened assistant session {}", session_id);
        ChatSessionResponse { session_id }
    }

    pub async fn end_session(&self, owner_id: &str, session_id: &str) -> SchoolResult<()> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(session) if session.owner_id == owner_id => {
                sessions.remove(session_id);
                info!("Closed assistant session {}", session_id);
                Ok(())
            }
            _ => Err(SchoolError::not_found("Chat session", session_id)),
        }
    }

    /// Send one user message and record the reply. A failed provider call
    /// leaves the history unchanged.
    pub async fn send_message(&self, owner_id: &str, session_id: &str, message: &str) -> SchoolResult<ChatReply> {
        let message = required("Message", message)?;
        let user_message = ChatMessage { role: ChatRole::User, content: message };

        let mut prompt = vec![ChatMessage { role: ChatRole::System, content: SYSTEM_PROMPT.to_string() }];
        {
            let sessions = self.sessions.lock().await;
            let session = sessions
                .get(session_id)
                .filter(|s| s.owner_id == owner_id)
                .ok_or_else(|| SchoolError::not_found("Chat session", session_id))?;
            prompt.extend(session.history.iter().cloned());
        }
        prompt.push(user_message.clone());

        let reply = match self.provider.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Assistant provider failed: {:#}", e);
                return Err(SchoolError::Assistant(e.to_string()));
            }
        };

        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| SchoolError::not_found("Chat session", session_id))?;
        session.history.push(user_message);
        session.history.push(ChatMessage { role: ChatRole::Assistant, content: reply.clone() });
        if session.history.len() > self.max_history {
            let excess = session.history.len() - self.max_history;
            session.history.drain(..excess);
        }

        Ok(ChatReply { session_id: session_id.to_string(), reply })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Echoes the last message and remembers every prompt it saw
    #[derive(Default)]
    pub(crate) struct EchoProvider {
        pub seen: StdMutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatProvider for EchoProvider {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("echo: {}", last))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ChatProvider for FailingProvider {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(anyhow!("upstream down"))
        }
    }

    #[tokio::test]
    async fn test_conversation_carries_system_prompt_and_history() {
        let provider = Arc::new(EchoProvider::default());
        let service = AssistantService::new(provider.clone(), 20);
        let session = service.create_session("o").await.session_id;

        let first = service.send_message("o", &session, "How do I add a class?").await.unwrap();
        assert_eq!(first.reply, "echo: How do I add a class?");
        service.send_message("o", &session, "And a student?").await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[1].len(), 4);
        assert_eq!(seen[1][0].role, ChatRole::System);
        assert_eq!(seen[1][0].content, SYSTEM_PROMPT);
        assert_eq!(seen[1][2].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_history_is_trimmed() {
        let provider = Arc::new(EchoProvider::default());
        let service = AssistantService::new(provider.clone(), 2);
        let session = service.create_session("o").await.session_id;

        for i in 0..3 {
            service.send_message("o", &session, &format!("q{}", i)).await.unwrap();
        }
        let seen = provider.seen.lock().unwrap();
        // system + 2 kept + new user message
        assert_eq!(seen[2].len(), 4);
        assert_eq!(seen[2][1].content, "q1");
    }

    #[tokio::test]
    async fn test_sessions_are_owner_scoped() {
        let service = AssistantService::new(Arc::new(EchoProvider::default()), 10);
        let session = service.create_session("o").await.session_id;

        assert!(matches!(service.send_message("x", &session, "hi").await, Err(SchoolError::NotFound(_))));
        assert!(matches!(service.end_session("x", &session).await, Err(SchoolError::NotFound(_))));
        assert!(matches!(service.send_message("o", &session, "  ").await, Err(SchoolError::Validation(_))));

        service.end_session("o", &session).await.unwrap();
        assert!(matches!(service.send_message("o", &session, "hi").await, Err(SchoolError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_assistant_error() {
        let service = AssistantService::new(Arc::new(FailingProvider), 10);
        let session = service.create_session("o").await.session_id;
        assert!(matches!(service.send_message("o", &session, "hi").await, Err(SchoolError::Assistant(_))));
    }

    #[tokio::test]
    async fn test_http_provider_requires_api_key() {
        let provider = HttpChatProvider::new(AssistantConfig { api_key: None, ..AssistantConfig::default() });
        let err = provider.complete(&[]).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
