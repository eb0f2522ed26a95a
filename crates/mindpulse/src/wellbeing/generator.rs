//! Text generation boundary used for nudges, survey summaries, and coach replies.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

/// Black-box capability turning a prompt into response text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generation failure; callers decide whether it is fatal.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("text generation is not configured: {0}")]
    NotConfigured(String),
    #[error("generation request failed: {0}")]
    Transport(String),
    #[error("generation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation response could not be decoded: {0}")]
    Decode(String),
    #[error("generation response contained no text")]
    EmptyResponse,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 1],
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Deserialize)]
struct CompletionChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
///
/// Uses the blocking reqwest client, so calls must run off the async executor
/// (`tokio::task::spawn_blocking` inside the HTTP service). The client is built on
/// first use for the same reason.
pub struct ChatCompletionsGenerator {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    client: Mutex<Option<Client>>,
}

impl ChatCompletionsGenerator {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenerationError::NotConfigured("GENERATOR_API_KEY is not set".into()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            timeout: config.timeout,
            client: Mutex::new(None),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> Result<Client, GenerationError> {
        let mut guard = self
            .client
            .lock()
            .map_err(|_| GenerationError::Transport("http client lock poisoned".to_string()))?;

        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        *guard = Some(client.clone());
        Ok(client)
    }
}

impl TextGenerator for ChatCompletionsGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [CompletionMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client()?
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: CompletionResponse = response
            .json()
            .map_err(|err| GenerationError::Decode(err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}
