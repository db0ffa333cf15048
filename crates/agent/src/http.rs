//! reqwest-backed inference client for the providers `[llm]` can name.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use leadflow_core::config::{LlmConfig, LlmProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::llm::{LlmClient, PromptMessage, PromptRole};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

pub struct HttpLlmClient {
    client: reqwest::Client,
    provider: LlmProvider,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build inference http client")?;

        let base_url = config.resolved_base_url();

        if matches!(config.provider, LlmProvider::OpenAi | LlmProvider::Anthropic)
            && config.api_key.is_none()
        {
            bail!("llm provider {:?} requires an api key", config.provider);
        }

        Ok(Self {
            client,
            provider: config.provider,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .ok_or_else(|| anyhow!("missing api key for {:?}", self.provider))
    }

    async fn post<B, R>(&self, request: reqwest::RequestBuilder, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = request
            .json(body)
            .send()
            .await
            .with_context(|| format!("inference request to {:?} failed", self.provider))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("inference service returned {status}: {}", truncate(&detail, 512));
        }

        response.json::<R>().await.context("inference response was not valid json")
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        tracing::debug!(
            event_name = "llm.request.sent",
            provider = ?self.provider,
            model = %self.model,
            message_count = messages.len(),
            "sending inference request"
        );

        match self.provider {
            LlmProvider::OpenAi => {
                let url = format!("{}/v1/chat/completions", self.base_url);
                let body = openai_request(&self.model, self.temperature, messages);
                let request = self.client.post(url).bearer_auth(self.api_key()?);
                let response: OpenAiResponse = self.post(request, &body).await?;
                response.into_text()
            }
            LlmProvider::Anthropic => {
                let url = format!("{}/v1/messages", self.base_url);
                let body = anthropic_request(&self.model, self.temperature, messages);
                let request = self
                    .client
                    .post(url)
                    .header("x-api-key", self.api_key()?)
                    .header("anthropic-version", ANTHROPIC_VERSION);
                let response: AnthropicResponse = self.post(request, &body).await?;
                response.into_text()
            }
            LlmProvider::Ollama => {
                let url = format!("{}/api/chat", self.base_url);
                let body = ollama_request(&self.model, self.temperature, messages);
                let response: OllamaResponse = self.post(self.client.post(url), &body).await?;
                Ok(response.message.content)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn chat_messages(messages: &[PromptMessage]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|message| ChatMessage { role: message.role.as_str(), content: &message.content })
        .collect()
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

fn openai_request<'a>(
    model: &'a str,
    temperature: f32,
    messages: &'a [PromptMessage],
) -> OpenAiRequest<'a> {
    OpenAiRequest { model, temperature, messages: chat_messages(messages) }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| anyhow!("inference response contained no choices"))
    }
}

/// Anthropic takes the system prompt out of band and only user/assistant turns inline.
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage<'a>>,
}

fn anthropic_request<'a>(
    model: &'a str,
    temperature: f32,
    messages: &'a [PromptMessage],
) -> AnthropicRequest<'a> {
    let system = messages
        .iter()
        .filter(|message| message.role == PromptRole::System)
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    AnthropicRequest {
        model,
        max_tokens: ANTHROPIC_MAX_TOKENS,
        temperature,
        system: (!system.is_empty()).then_some(system),
        messages: messages
            .iter()
            .filter(|message| message.role != PromptRole::System)
            .map(|message| ChatMessage { role: message.role.as_str(), content: &message.content })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicResponse {
    fn into_text(self) -> Result<String> {
        let text = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>();
        if text.is_empty() {
            bail!("inference response contained no text blocks");
        }
        Ok(text.join(""))
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

fn ollama_request<'a>(
    model: &'a str,
    temperature: f32,
    messages: &'a [PromptMessage],
) -> OllamaRequest<'a> {
    OllamaRequest {
        model,
        messages: chat_messages(messages),
        stream: false,
        options: OllamaOptions { temperature },
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
