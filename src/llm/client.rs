use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

/// Sampling knobs sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.3,
            top_p: 0.8,
        }
    }
}

// Together-style text completions format
#[derive(Debug, Clone, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("TOGETHER_API_KEY is not set")]
    MissingKey,

    /// Non-success status; `body` is the provider's raw response text.
    #[error("completion API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to send request to completion API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse completion API response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl LlmClient {
    pub fn new(client: reqwest::Client, api_key: Option<&str>, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
        }
    }

    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        sampling: Sampling,
    ) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingKey)?;

        let request = CompletionRequest {
            model,
            prompt,
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let api_response: CompletionResponse =
            response.json().await.map_err(LlmError::Decode)?;

        let text = api_response
            .choices
            .first()
            .and_then(|c| c.text.as_deref())
            .unwrap_or("")
            .trim()
            .to_string();

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(LlmResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }
}
