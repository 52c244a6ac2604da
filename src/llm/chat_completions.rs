//! Blocking client for an OpenAI-compatible chat-completions endpoint.
//!
//! Goals:
//! - No `unsafe`.
//! - Blocking HTTP for a deterministic single round trip per turn; the
//!   presentation layer dispatches the call to a worker so the UI thread
//!   never blocks on the network.
//! - Every failure mode (non-success status, timeout, refused connection,
//!   malformed body, absent content field) becomes a
//!   [`ChatError::CompletionService`] with a displayable cause; this path
//!   must always return something the user can be shown.
//!
//! No retry, no backoff, no streaming: one request, one complete reply.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chat::config::ChatConfig;
use crate::chat::errors::{ChatError, ChatResult};
use crate::chat::message::Message;

/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Overall request timeout for long generations.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One request/response exchange with the remote completion service.
pub trait CompletionBackend: Send + Sync {
    /// Send the full ordered message list and return the generated
    /// assistant content.
    ///
    /// # Errors
    /// Returns [`ChatError::CompletionService`] on any non-success status or
    /// transport failure.
    fn complete(&self, messages: &[Message], model: &str, temperature: f32)
    -> ChatResult<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Extract the top choice's assistant content, if present.
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

/// [`CompletionBackend`] speaking the OpenAI chat-completions shape with a
/// static bearer credential.
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl ChatCompletionsClient {
    /// Build a client from the configured endpoint and credential.
    ///
    /// The credential is attached to every request and never validated
    /// locally; a missing or invalid key surfaces as a response-status
    /// error at request time.
    ///
    /// # Errors
    /// Returns [`ChatError::CompletionService`] if the endpoint URL is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: &ChatConfig) -> ChatResult<Self> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|e| ChatError::CompletionService(format!("invalid endpoint url: {e}")))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::CompletionService(format!("http client build failed: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

impl CompletionBackend for ChatCompletionsClient {
    fn complete(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f32,
    ) -> ChatResult<String> {
        let request = ChatRequest {
            model,
            messages,
            temperature,
        };

        debug!("Requesting completion: model={model}, {} messages", messages.len());

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| ChatError::CompletionService(format!("transport failure: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChatError::CompletionService(format!(
                "status {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ChatError::CompletionService(format!("malformed response body: {e}")))?;

        parsed.into_content().ok_or_else(|| {
            ChatError::CompletionService("response contained no assistant content".to_string())
        })
    }
}
