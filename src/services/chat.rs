// src/services/chat.rs

//! AI career assistant client.
//!
//! Talks to a chat-completion API directly when a key is configured and to
//! the backend's `/api/chat` route otherwise. The assistant never leaves the
//! user without an answer: any failure turns into a canned, clearly
//! degraded reply.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{ChatConfig, Config};
use crate::utils::endpoint;
use crate::utils::http::{create_async_client, parse_json_body, with_deadline};

/// Confidence reported for canned replies.
pub const DEGRADED_CONFIDENCE: f32 = 0.5;

const SYSTEM_PROMPT: &str = "You are Pathwise AI, a career guidance assistant specializing in \
STEM fields. Help users explore STEM career paths, recommend learning resources and courses, \
prepare for technical interviews, and answer questions about mathematics and technical concepts. \
Give specific, actionable advice and mention relevant resources when possible. When recommending \
careers, consider salary, growth rate, required skills and the learning path.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Value>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub recommended_careers: Vec<String>,
    /// True when this is a canned reply produced without the assistant
    #[serde(default)]
    pub degraded: bool,
}

fn default_confidence() -> f32 {
    0.8
}

/// Backend `/api/chat` reply, before the metadata is flattened.
#[derive(Debug, Deserialize)]
struct BackendReply {
    response: String,
    #[serde(default)]
    sources: Vec<Value>,
    #[serde(default = "default_confidence")]
    confidence: f32,
    #[serde(default)]
    metadata: Option<BackendMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendMetadata {
    #[serde(default)]
    recommended_careers: Vec<String>,
}

/// Canned reply for when neither the assistant nor the backend answered.
pub fn degraded_reply(message: &str) -> ChatReply {
    let lower = message.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let response = if has(&["interview", "leetcode", "coding question"]) {
        "I can't reach the assistant right now. Meanwhile, the Interview Prep page has \
         practice questions with hints and solution approaches, and the Practice page lets \
         you work through problems by difficulty."
    } else if has(&["learn", "study", "course", "resource"]) {
        "I can't reach the assistant right now. The Resources page lists courses and \
         tutorials by category; filtering by your target career is a good place to start."
    } else if has(&["career", "job", "salary", "profession", "role"]) {
        "I can't reach the assistant right now. You can still browse the Careers page to \
         compare salaries, growth rates, required skills and education for STEM roles."
    } else {
        "I'm here to help with your STEM career journey! I can assist with career \
         exploration, learning resources, interview preparation, and mathematics. I can't \
         reach the assistant right now, so please try again in a moment."
    };

    ChatReply {
        response: response.to_string(),
        sources: Vec::new(),
        confidence: DEGRADED_CONFIDENCE,
        recommended_careers: Vec::new(),
        degraded: true,
    }
}

/// Conversation with the career assistant.
pub struct ChatService {
    client: Client,
    backend_url: String,
    config: ChatConfig,
    timeout: Duration,
    history: Mutex<VecDeque<ChatMessage>>,
}

impl ChatService {
    pub fn new(
        client: Client,
        backend_url: impl Into<String>,
        config: ChatConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            backend_url: backend_url.into(),
            config,
            timeout,
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.api)?;
        // Completions are slow; give them at least 30s.
        let timeout = config.api.timeout().max(Duration::from_secs(30));
        Ok(Self::new(
            client,
            config.api.base_url.clone(),
            config.chat.clone(),
            timeout,
        ))
    }

    /// True when completions go straight to the chat API.
    pub fn is_direct(&self) -> bool {
        self.api_key().is_some()
    }

    /// Ask the assistant. Only an empty message is an error; everything else
    /// degrades to a canned reply.
    pub async fn send(&self, message: &str, context: Option<&Value>) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::validation("message cannot be empty"));
        }

        let outcome = match self.api_key() {
            Some(key) => self.complete_direct(key, message, context).await,
            None => self.ask_backend(message, context).await,
        };

        match outcome {
            Ok(reply) => {
                self.remember(message, &reply.response);
                Ok(reply)
            }
            Err(e) => {
                log::warn!("Chat request failed: {e}; replying with canned response");
                Ok(degraded_reply(message))
            }
        }
    }

    /// Forget the conversation so far.
    pub fn clear_history(&self) {
        self.history().clear();
    }

    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.history().iter().cloned().collect()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<ChatMessage>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remember(&self, question: &str, answer: &str) {
        let max = self.config.max_history;
        let mut history = self.history();
        history.push_back(ChatMessage::new(Role::User, question));
        history.push_back(ChatMessage::new(Role::Assistant, answer));
        while history.len() > max {
            history.pop_front();
        }
    }

    /// System prompt, prior turns, then the new message.
    fn completion_messages(&self, message: &str, context: Option<&Value>) -> Vec<ChatMessage> {
        let mut system = SYSTEM_PROMPT.to_string();
        if let Some(context) = context.filter(|c| !c.is_null()) {
            system.push_str("\n\nContext: ");
            system.push_str(&context.to_string());
        }

        let mut messages = vec![ChatMessage::new(Role::System, system)];
        messages.extend(self.history().iter().cloned());
        messages.push(ChatMessage::new(Role::User, message));
        messages
    }

    async fn complete_direct(
        &self,
        key: &str,
        message: &str,
        context: Option<&Value>,
    ) -> Result<ChatReply> {
        let url = endpoint(&self.config.api_base_url, "/v1/chat/completions")?;
        let body = json!({
            "model": self.config.model,
            "messages": self.completion_messages(message, context),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });
        let request = self.client.post(url.clone()).bearer_auth(key).json(&body);

        let value = post_json(url.as_str(), request, self.timeout).await?;
        let content = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::EmptyPayload(url.to_string()))?;

        Ok(ChatReply {
            response: content.to_string(),
            sources: Vec::new(),
            confidence: 0.9,
            recommended_careers: Vec::new(),
            degraded: false,
        })
    }

    async fn ask_backend(&self, message: &str, context: Option<&Value>) -> Result<ChatReply> {
        let url = endpoint(&self.backend_url, "/api/chat")?;
        let request = self
            .client
            .post(url.clone())
            .json(&json!({ "message": message, "context": context }));

        let value = post_json(url.as_str(), request, self.timeout).await?;
        parse_backend_reply(value)
    }
}

async fn post_json(label: &str, request: reqwest::RequestBuilder, timeout: Duration) -> Result<Value> {
    with_deadline(label, timeout, async {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::status(label, status.as_u16()));
        }
        let body = response.bytes().await?;
        parse_json_body(label, &body)
    })
    .await
}

/// Accepts a bare reply, `{success: true, data: reply}`, or the error
/// envelope `{success: false, message, error}`.
fn parse_backend_reply(value: Value) -> Result<ChatReply> {
    let reply = match value.get("success").and_then(Value::as_bool) {
        Some(false) => {
            let message = ["message", "error"]
                .iter()
                .find_map(|k| value.get(*k).and_then(Value::as_str))
                .unwrap_or("chat request failed");
            return Err(AppError::Remote(message.to_string()));
        }
        Some(true) => value.get("data").cloned().unwrap_or(Value::Null),
        None => value,
    };

    let parsed: BackendReply = serde_json::from_value(reply)?;
    if parsed.response.trim().is_empty() {
        return Err(AppError::EmptyPayload("chat reply".into()));
    }
    Ok(ChatReply {
        response: parsed.response,
        sources: parsed.sources,
        confidence: parsed.confidence,
        recommended_careers: parsed.metadata.unwrap_or_default().recommended_careers,
        degraded: false,
    })
}
