use super::context::ModelRequest;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: None,
            max_output_tokens: None,
            timeout: Duration::from_secs(60), // LLM calls can be slow
        }
    }
}

#[async_trait::async_trait]
pub trait LLMClient: Send + Sync {
    /// Send priming pair, history and the new turn; returns the reply text.
    async fn send(&self, request: &ModelRequest) -> Result<String, LLMError>;
}

pub struct GeminiLLM {
    client: Client,
    api_key: String,
    config: LLMConfig,
}

impl GeminiLLM {
    pub fn new(api_key: String) -> Result<Self, LLMError> {
        Self::with_config(api_key, LLMConfig::default())
    }

    pub fn with_config(api_key: String, config: LLMConfig) -> Result<Self, LLMError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the generateContent payload, turns in send order
    pub fn build_payload(&self, request: &ModelRequest) -> Value {
        let contents: Vec<Value> = request
            .turns()
            .map(|turn| {
                json!({
                    "role": turn.role.as_str(),
                    "parts": [{ "text": turn.text }]
                })
            })
            .collect();

        let mut payload = json!({ "contents": contents });

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = self.config.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = self.config.max_output_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        payload
    }

    /// Extract the reply text from a generateContent response
    pub fn parse_response(response_text: &str) -> Result<String, LLMError> {
        let json: Value = serde_json::from_str(response_text)
            .map_err(|e| LLMError::ParseError(format!("Invalid JSON: {}", e)))?;

        let candidates = json["candidates"]
            .as_array()
            .ok_or_else(|| match json["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => LLMError::Backend(format!("Prompt blocked: {}", reason)),
                None => LLMError::ParseError("Missing 'candidates' field".to_string()),
            })?;

        let first = candidates
            .first()
            .ok_or_else(|| LLMError::ParseError("Empty candidates array".to_string()))?;

        let parts = first["content"]["parts"].as_array().ok_or_else(|| {
            let reason = first["finishReason"].as_str().unwrap_or("unknown");
            LLMError::Backend(format!("Response has no content (finish reason: {})", reason))
        })?;

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        if text.is_empty() {
            return Err(LLMError::Backend("Response contained no text".to_string()));
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl LLMClient for GeminiLLM {
    async fn send(&self, request: &ModelRequest) -> Result<String, LLMError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let payload = self.build_payload(request);
        log::debug!("📤 {}", request.summary());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        Self::parse_response(&response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::context::Turn;
    use crate::llm::prompts::PRIMING_ACKNOWLEDGMENT;

    #[test]
    fn test_config_defaults() {
        let config = LLMConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.base_url.starts_with("https://"));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_payload_keeps_turn_order() {
        let llm = GeminiLLM::new("AIzaTest".to_string()).unwrap();
        let request = ModelRequest::new(
            "You are terse",
            vec![Turn::user("hi"), Turn::model("hello")],
            Turn::user("bye"),
            0,
        );

        let payload = llm.build_payload(&request);
        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 5);

        let roles: Vec<&str> = contents
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user", "model", "user"]);
        assert_eq!(contents[0]["parts"][0]["text"], "You are terse");
        assert_eq!(contents[1]["parts"][0]["text"], PRIMING_ACKNOWLEDGMENT);
        assert_eq!(contents[4]["parts"][0]["text"], "bye");
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn test_payload_generation_config() {
        let config = LLMConfig {
            temperature: Some(0.5),
            max_output_tokens: Some(256),
            ..LLMConfig::default()
        };
        let llm = GeminiLLM::with_config("AIzaTest".to_string(), config).unwrap();
        let request = ModelRequest::new("p", vec![], Turn::user("q"), 0);

        let payload = llm.build_payload(&request);
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(payload["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " there"}]},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(GeminiLLM::parse_response(body).unwrap(), "Hello there");
    }

    #[test]
    fn test_parse_response_errors() {
        assert!(matches!(
            GeminiLLM::parse_response("not json"),
            Err(LLMError::ParseError(_))
        ));
        assert!(matches!(
            GeminiLLM::parse_response(r#"{"candidates": []}"#),
            Err(LLMError::ParseError(_))
        ));
        assert!(matches!(
            GeminiLLM::parse_response(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#),
            Err(LLMError::Backend(msg)) if msg.contains("SAFETY")
        ));
        assert!(matches!(
            GeminiLLM::parse_response(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#),
            Err(LLMError::Backend(msg)) if msg.contains("MAX_TOKENS")
        ));
    }
}
