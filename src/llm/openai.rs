use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.4;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct OpenAiClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub default_temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OpenAiClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            cfg.base_url = base;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            cfg.default_model = model;
        }
        if let Ok(temp) = std::env::var("OPENAI_TEMPERATURE") {
            if let Ok(parsed) = temp.parse::<f32>() {
                cfg.default_temperature = parsed;
            }
        }
        if let Ok(timeout) = std::env::var("OPENAI_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Duration::from_secs(parsed);
            }
        }
        cfg
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: HttpClient,
    cfg: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(cfg: OpenAiClientConfig) -> Result<Self, OpenAiError> {
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(OpenAiError::from_reqwest)?;
        Ok(Self { http, cfg })
    }

    pub fn default_model(&self) -> &str {
        &self.cfg.default_model
    }

    fn resolve_api_key(&self) -> Result<&str, OpenAiError> {
        self.cfg.api_key.as_deref().ok_or(OpenAiError::MissingApiKey)
    }

    fn endpoint(&self) -> Result<Url, OpenAiError> {
        let raw = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        let url = Url::parse(&raw).map_err(|_| OpenAiError::InvalidBaseUrl(self.cfg.base_url.clone()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(OpenAiError::InvalidBaseUrl(self.cfg.base_url.clone())),
        }
    }

    fn build_api_request(&self, req: &ChatCompletionRequest) -> ApiChatCompletionRequest {
        ApiChatCompletionRequest {
            model: req
                .model
                .clone()
                .unwrap_or_else(|| self.cfg.default_model.clone()),
            temperature: req
                .temperature
                .unwrap_or(self.cfg.default_temperature),
            max_tokens: req.max_tokens,
            messages: req
                .messages
                .iter()
                .map(|m| ApiChatMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                    refusal: None,
                })
                .collect(),
            response_format: req.response_format.as_ref().map(ApiResponseFormat::from),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiError>;
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiError> {
        if request.messages.is_empty() {
            return Err(OpenAiError::EmptyMessages);
        }

        // configuration problems never reach the network
        let api_key = self.resolve_api_key()?;
        let endpoint = self.endpoint()?;
        let api_request = self.build_api_request(&request);

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(OpenAiError::from_reqwest)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(OpenAiError::from_reqwest)?;

        if !status.is_success() {
            let api_err = serde_json::from_slice::<ApiErrorEnvelope>(&bytes)
                .ok()
                .map(|env| env.error);
            return Err(OpenAiError::Api {
                status,
                error: api_err.unwrap_or_default(),
            });
        }

        let parsed: ApiChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(OpenAiError::Decode)?;

        let choice = parsed.choices.into_iter().next();
        let (content, refusal) = match choice {
            Some(c) => (c.message.content, c.message.refusal),
            None => (None, None),
        };

        Ok(ChatCompletionResponse {
            content: content.filter(|c| !c.trim().is_empty()),
            refusal,
            usage: parsed.usage.map(|usage| UsageMetrics {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
}

/// Structured output constraint: the model may only answer with JSON
/// matching `schema`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ChatCompletionResponse {
    /// `None` when the service answered without a payload.
    pub content: Option<String>,
    pub refusal: Option<String>,
    pub usage: Option<UsageMetrics>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UsageMetrics {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid OPENAI_BASE_URL: {0}")]
    InvalidBaseUrl(String),
    #[error("chat completion requires at least one message")]
    EmptyMessages,
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("api error {status}: {}", .error.message)]
    Api {
        status: StatusCode,
        error: ApiErrorBody,
    },
    #[error("mock client response queue is empty")]
    MockQueueEmpty,
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl OpenAiError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OpenAiError::Timeout
        } else {
            OpenAiError::Http(err)
        }
    }

    /// Errors raised before any request leaves the process.
    pub fn is_configuration(&self) -> bool {
        matches!(self, OpenAiError::MissingApiKey | OpenAiError::InvalidBaseUrl(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl Default for ApiErrorBody {
    fn default() -> Self {
        Self {
            message: "unknown error".to_string(),
            r#type: None,
            code: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
struct ApiChatCompletionRequest {
    model: String,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<ApiChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ApiResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ApiResponseFormat {
    r#type: &'static str,
    json_schema: ApiJsonSchema,
}

#[derive(Debug, Clone, Serialize)]
struct ApiJsonSchema {
    name: String,
    schema: Value,
    strict: bool,
}

impl From<&ResponseFormat> for ApiResponseFormat {
    fn from(fmt: &ResponseFormat) -> Self {
        Self {
            r#type: "json_schema",
            json_schema: ApiJsonSchema {
                name: fmt.name.clone(),
                schema: fmt.schema.clone(),
                strict: fmt.strict,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiChatMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing)]
    refusal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiChatCompletionResponse {
    choices: Vec<ApiChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiChatChoice {
    message: ApiChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[cfg(test)]
pub(crate) use mock::MockClient;

#[cfg(test)]
mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays queued responses and records every request.
    #[derive(Debug, Default)]
    pub struct MockClient {
        responses: Mutex<VecDeque<Result<ChatCompletionResponse, OpenAiError>>>,
        calls: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, resp: Result<ChatCompletionResponse, OpenAiError>) {
            self.responses.lock().unwrap().push_back(resp);
        }

        pub fn push_content(&self, content: impl Into<String>) {
            self.push_response(Ok(ChatCompletionResponse {
                content: Some(content.into()),
                ..Default::default()
            }));
        }

        pub fn calls(&self) -> Vec<ChatCompletionRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockClient {
        async fn chat_completion(
            &self,
            request: ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, OpenAiError> {
            self.calls.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(OpenAiError::MockQueueEmpty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_with(cfg: OpenAiClientConfig) -> OpenAiClient {
        OpenAiClient::new(cfg).unwrap()
    }

    fn sample_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: None,
            messages: vec![
                ChatMessage::new(ChatRole::System, "You are a chef."),
                ChatMessage::new(ChatRole::User, "蒸魚"),
            ],
            max_tokens: Some(512),
            temperature: Some(0.3),
            response_format: Some(ResponseFormat {
                name: "meal_plan".into(),
                schema: json!({"type": "object"}),
                strict: true,
            }),
        }
    }

    #[test]
    fn build_request_serializes_messages_and_schema() {
        let client = client_with(OpenAiClientConfig {
            api_key: Some("test".into()),
            ..Default::default()
        });

        let api_request = client.build_api_request(&sample_request());
        let value = serde_json::to_value(&api_request).unwrap();

        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "蒸魚");
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
        assert_eq!(value["max_tokens"], 512);
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "meal_plan");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert!(value["messages"][0].get("refusal").is_none());
    }

    #[test]
    fn build_request_omits_absent_format() {
        let client = client_with(OpenAiClientConfig::default());
        let mut req = sample_request();
        req.response_format = None;
        req.max_tokens = None;
        let value = serde_json::to_value(client.build_api_request(&req)).unwrap();
        assert!(value.get("response_format").is_none());
        assert!(value.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // unroutable base url: reaching the network would surface as Http, not MissingApiKey
        let client = client_with(OpenAiClientConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        });
        let err = client.chat_completion(sample_request()).await.unwrap_err();
        assert!(matches!(err, OpenAiError::MissingApiKey));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn bad_base_url_is_a_configuration_error() {
        let client = client_with(OpenAiClientConfig {
            api_key: Some("k".into()),
            base_url: "not a url".into(),
            ..Default::default()
        });
        let err = client.chat_completion(sample_request()).await.unwrap_err();
        assert!(matches!(err, OpenAiError::InvalidBaseUrl(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = OpenAiError::Api {
            status: StatusCode::BAD_REQUEST,
            error: ApiErrorBody {
                message: "bad request".into(),
                r#type: Some("invalid_request_error".into()),
                code: None,
            },
        };

        assert_eq!(format!("{err}"), "api error 400 Bad Request: bad request");
        assert!(!err.is_configuration());
    }

    #[test]
    fn completion_response_tolerates_null_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null,"refusal":"no"}}],"usage":null}"#;
        let parsed: ApiChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert_eq!(parsed.choices[0].message.refusal.as_deref(), Some("no"));
    }

    #[tokio::test]
    async fn mock_client_returns_enqueued_response() {
        let mock = MockClient::new();
        mock.push_content("{}");

        let req = sample_request();
        let out = mock.chat_completion(req.clone()).await.unwrap();

        assert_eq!(out.content.as_deref(), Some("{}"));
        assert_eq!(mock.calls(), vec![req]);
        assert!(matches!(
            mock.chat_completion(sample_request()).await,
            Err(OpenAiError::MockQueueEmpty)
        ));
    }
}
