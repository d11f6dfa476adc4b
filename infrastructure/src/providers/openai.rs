//! OpenAI-compatible chat-completions provider
//!
//! Implements the [`SolverGateway`] port against any endpoint speaking
//! the chat-completions protocol. One adapter instance serves every
//! slot — which model answers is chosen per invocation, and each call is
//! an independent single-turn request with no shared conversation state,
//! as the port requires.

use async_trait::async_trait;
use ensemble_application::ports::solver_gateway::{GatewayError, SolverGateway};
use ensemble_domain::Model;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default public endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Low temperature for more consistent solver output
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Gateway for OpenAI-compatible chat-completions endpoints.
///
/// Credentials and endpoint are constructor parameters — nothing is
/// read from ambient process state here.
pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent("ExamEnsemble/0.1")
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Override the sampling temperature (clamped to 0.0..=2.0)
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl SolverGateway for OpenAiGateway {
    async fn invoke(
        &self,
        model: &Model,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        debug!("Invoking {} at {}", model, self.base_url);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::ConnectionError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotAvailable(model.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("Invalid response body: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(GatewayError::EmptyResponse)?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = OpenAiGateway::new("https://example.test/v1/", "key").unwrap();
        assert_eq!(gateway.base_url(), "https://example.test/v1");
    }

    #[test]
    fn test_temperature_clamped() {
        let gateway = OpenAiGateway::new(DEFAULT_BASE_URL, "key")
            .unwrap()
            .with_temperature(9.0);
        assert_eq!(gateway.temperature, 2.0);
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            temperature: 0.3,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Final Answer: 4"}}
            ],
            "usage": {"total_tokens": 20}
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Final Answer: 4")
        );
    }
}
