//! Anthropic Messages API client for chemistry recommendations.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::AdvisorConfig;

use super::Advisor;
use super::error::{AdvisorError, ApiErrorResponse};
use super::prompt::{AdjustmentRequest, SYSTEM_PROMPT, TOOL_NAME, output_schema};
use super::response::Recommendation;
use super::types::{ChatRequest, ChatResponse, Message, Tool, ToolChoice};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.2;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Chemistry advisor backed by the Anthropic Messages API.
///
/// Each call sends one request that forces the `record_adjustments` tool,
/// whose input schema is the recommendation shape. Calls are never retried.
#[derive(Clone)]
pub struct AdvisorClient {
    inner: Arc<AdvisorClientInner>,
}

struct AdvisorClientInner {
    client: reqwest::Client,
    model: String,
    endpoint: Url,
}

impl std::fmt::Debug for AdvisorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorClient")
            .field("model", &self.inner.model)
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl AdvisorClient {
    /// Create a new advisor client.
    ///
    /// # Errors
    ///
    /// Returns `AdvisorError::InvalidConfiguration` if the API key contains
    /// characters not allowed in a header, or the HTTP client cannot be built.
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config.api_key.expose_secret();

        let mut key_header = HeaderValue::from_str(api_key).map_err(|_| {
            AdvisorError::InvalidConfiguration("API key is not a valid header value".to_string())
        })?;
        key_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", key_header);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdvisorError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(AdvisorClientInner {
                client,
                model: config.model.clone(),
                endpoint: config.endpoint.clone(),
            }),
        })
    }

    /// Create a client from optional configuration.
    ///
    /// # Errors
    ///
    /// Returns `AdvisorError::MissingApiKey` when `config` is `None`, without
    /// touching the network.
    pub fn from_config(config: Option<&AdvisorConfig>) -> Result<Self, AdvisorError> {
        config.map_or(Err(AdvisorError::MissingApiKey), Self::new)
    }

    /// Build the request body for an adjustment request.
    #[must_use]
    pub fn chat_request(&self, request: &AdjustmentRequest) -> ChatRequest {
        ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![Message::user(request.prompt())],
            system: Some(SYSTEM_PROMPT.to_string()),
            tools: Some(vec![recommendation_tool()]),
            tool_choice: Some(ToolChoice::Tool {
                name: TOOL_NAME.to_string(),
            }),
            temperature: Some(TEMPERATURE),
        }
    }

    /// Request dosing recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API returns an error
    /// status, or the reply does not contain a valid recommendation.
    #[instrument(
        skip(self, request),
        fields(model = %self.inner.model, pool = %request.pool.name, category = %request.pool.category)
    )]
    pub async fn recommend(
        &self,
        request: &AdjustmentRequest,
    ) -> Result<Recommendation, AdvisorError> {
        let body = self.chat_request(request);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let chat = self.handle_response(response).await?;
        debug!(
            response_id = %chat.id,
            input_tokens = chat.usage.input_tokens,
            output_tokens = chat.usage.output_tokens,
            "Advisor replied"
        );

        extract_recommendation(&chat)
    }

    /// Handle a response, parsing the body on success.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<ChatResponse, AdvisorError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| AdvisorError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(self.handle_error_status(status, response).await)
        }
    }

    /// Map an error status code.
    async fn handle_error_status(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> AdvisorError {
        warn!(%status, model = %self.inner.model, "Advisor request failed");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return AdvisorError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return AdvisorError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => serde_json::from_str::<ApiErrorResponse>(&body).map_or_else(
                |_| AdvisorError::Api {
                    error_type: format!("http_{}", status.as_u16()),
                    message: body,
                },
                |api_error| AdvisorError::Api {
                    error_type: api_error.error.error_type,
                    message: api_error.error.message,
                },
            ),
            Err(e) => AdvisorError::Http(e),
        }
    }
}

impl Advisor for AdvisorClient {
    async fn recommend(&self, request: &AdjustmentRequest) -> Result<Recommendation, AdvisorError> {
        Self::recommend(self, request).await
    }
}

/// The forced tool whose input is the recommendation.
#[must_use]
pub fn recommendation_tool() -> Tool {
    Tool {
        name: TOOL_NAME.to_string(),
        description: "Record the water balance analysis and the chemical adjustments to apply."
            .to_string(),
        input_schema: output_schema(),
    }
}

/// Pull the recommendation out of a reply.
///
/// The tool input is preferred; a JSON text block is accepted as a fallback.
///
/// # Errors
///
/// Returns `AdvisorError::InvalidRecommendation` if neither is present or
/// the payload fails validation.
pub fn extract_recommendation(chat: &ChatResponse) -> Result<Recommendation, AdvisorError> {
    if let Some(input) = chat.tool_input(TOOL_NAME) {
        return Recommendation::from_value(input.clone());
    }

    let text = chat.text();
    if text.trim().is_empty() {
        return Err(AdvisorError::InvalidRecommendation(
            "reply contains no recommendation".to_string(),
        ));
    }
    Recommendation::from_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> AdvisorConfig {
        AdvisorConfig::with_defaults(SecretString::from("sk-ant-test-Zq8r2LmN5vX1")).expect("config")
    }

    fn chat(content: serde_json::Value) -> ChatResponse {
        serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "tool_use",
            "content": content,
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .expect("chat response")
    }

    #[test]
    fn test_from_config_requires_key() {
        let err = AdvisorClient::from_config(None).expect_err("missing key");
        assert!(matches!(err, AdvisorError::MissingApiKey));
        assert!(AdvisorClient::from_config(Some(&config())).is_ok());
    }

    #[test]
    fn test_invalid_header_key_rejected() {
        let mut config = config();
        config.api_key = SecretString::from("bad\nkey");
        let err = AdvisorClient::new(&config).expect_err("invalid header");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_debug_hides_key() {
        let client = AdvisorClient::new(&config()).expect("client");
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-ant"));
    }

    #[test]
    fn test_extract_from_tool_use() {
        let reply = chat(serde_json::json!([
            {"type": "tool_use", "id": "t1", "name": "record_adjustments",
             "input": {"analysis": "Low chlorine.", "adjustments": [
                {"chemicalName": "Liquid Chlorine", "amount": 0.5, "unit": "gal", "reason": "Raise FC"}
             ]}}
        ]));
        let rec = extract_recommendation(&reply).expect("recommendation");
        assert_eq!(rec.adjustments[0].chemical_name, "Liquid Chlorine");
    }

    #[test]
    fn test_extract_falls_back_to_text() {
        let reply = chat(serde_json::json!([
            {"type": "text", "text": "{\"analysis\": \"Balanced.\", \"adjustments\": []}"}
        ]));
        let rec = extract_recommendation(&reply).expect("recommendation");
        assert_eq!(rec.analysis, "Balanced.");
    }

    #[test]
    fn test_extract_rejects_empty_reply() {
        let reply = chat(serde_json::json!([]));
        assert!(matches!(
            extract_recommendation(&reply),
            Err(AdvisorError::InvalidRecommendation(_))
        ));
    }
}
