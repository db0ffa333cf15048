use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl PromptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: PromptRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: PromptRole::User, content: content.into() }
    }
}

/// The inference service. Returns free text; callers parse it defensively.
/// An `Err` means the service itself could not be reached or refused the call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;
}

/// Deterministic client that replays queued replies in order and records every prompt.
///
/// Once the script runs out it keeps answering with the fallback reply, if one was set,
/// and otherwise fails like an unreachable service.
#[derive(Clone, Default)]
pub struct ScriptedLlmClient {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    fallback: Option<String>,
    prompts: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::default();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.replies).push_back(Err(message.into()));
    }

    pub fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        lock(&self.prompts).push(messages.to_vec());
        match lock(&self.replies).pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow!("scripted inference client has no reply queued")),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
