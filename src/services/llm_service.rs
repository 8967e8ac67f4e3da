use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::LlmError;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the generative-AI service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Reads `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_MODEL`, `GEMINI_BASE_URL`,
    /// `LLM_TIMEOUT_SECS` and `LLM_MAX_RETRIES`. A missing key is not an error.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_retries: std::env::var("LLM_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Object,
    String,
    Array,
}

/// Response-shape declaration sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ResponseSchema>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ResponseSchema>>,
}

impl ResponseSchema {
    pub fn string() -> Self {
        Self {
            kind: SchemaType::String,
            properties: BTreeMap::new(),
            variants: None,
            items: None,
        }
    }

    pub fn string_enum<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: Some(variants.into_iter().map(Into::into).collect()),
            ..Self::string()
        }
    }

    pub fn array(items: ResponseSchema) -> Self {
        Self {
            kind: SchemaType::Array,
            items: Some(Box::new(items)),
            ..Self::string()
        }
    }

    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, ResponseSchema)>,
        K: Into<String>,
    {
        Self {
            kind: SchemaType::Object,
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::string()
        }
    }
}

/// One prompt for the model, optionally constrained to a JSON shape.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub response_schema: Option<ResponseSchema>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    pub fn structured(prompt: impl Into<String>, schema: ResponseSchema) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }
}

/// Trait for generative-AI providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the raw text of the first candidate, possibly empty.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: String,
    response_schema: ResponseSchema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

impl GeminiResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

/// Gemini `generateContent` provider
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn call_gemini_with_retry(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let mut retry_count = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.call_gemini(request).await {
                Ok(response) => return Ok(response),
                Err(e) if retry_count < self.max_retries => {
                    retry_count += 1;
                    warn!("Gemini call failed (retry {}/{}): {}. Retrying in {:?}...",
                          retry_count, self.max_retries, e, delay);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_gemini(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let response = self.client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        response.json::<GeminiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        info!("Generating content (model: {}, structured: {})",
              self.model, request.response_schema.is_some());

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: request.prompt }],
            }],
            generation_config: request.response_schema.map(|schema| GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        };

        let response = self.call_gemini_with_retry(&body).await?;

        if let Some(usage) = &response.usage_metadata {
            info!("Gemini tokens: {} prompt + {} candidates = {} total",
                  usage.prompt_token_count.unwrap_or(0),
                  usage.candidates_token_count.unwrap_or(0),
                  usage.total_token_count.unwrap_or(0));
        }

        let text = response.text();
        if text.is_empty() {
            let reason = response.candidates.first().and_then(|c| c.finish_reason.as_deref());
            warn!("Gemini returned no text (finish reason: {:?})", reason);
        }

        Ok(text)
    }
}

/// Front door to the configured provider; absent when no credential is set.
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Self {
        let provider = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => match GeminiProvider::new(key.to_string(), &config) {
                Ok(provider) => {
                    info!("Initializing LLM service with model: {}", config.model);
                    Some(Arc::new(provider) as Arc<dyn LlmProvider>)
                }
                Err(e) => {
                    error!("Failed to initialize Gemini provider: {}. AI features disabled.", e);
                    None
                }
            },
            _ => {
                warn!("No API Key found for Gemini. AI features disabled.");
                None
            }
        };

        Self { provider }
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let provider = self.provider.as_ref()
            .ok_or(LlmError::Disabled)?;

        provider.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "gemini-3-flash-preview");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_llm_service_disabled_without_key() {
        let service = LlmService::new(LlmConfig::default());
        assert!(!service.is_enabled());

        let blank = LlmService::new(LlmConfig {
            api_key: Some("   ".to_string()),
            ..LlmConfig::default()
        });
        assert!(!blank.is_enabled());
    }

    #[test]
    fn test_llm_service_enabled_with_key() {
        let service = LlmService::new(LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        });
        assert!(service.is_enabled());
    }

    #[tokio::test]
    async fn test_llm_service_returns_disabled_error() {
        let service = LlmService::disabled();
        let result = service.generate(GenerationRequest::text("test")).await;
        assert!(matches!(result, Err(LlmError::Disabled)));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let config = LlmConfig {
            base_url: "http://localhost:9000/v1beta/".to_string(),
            ..LlmConfig::default()
        };
        let provider = GeminiProvider::new("k".to_string(), &config).unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_schema_serializes_gemini_shape() {
        let schema = ResponseSchema::object([
            ("rating", ResponseSchema::string_enum(["Buy", "Hold"])),
            ("keyPoints", ResponseSchema::array(ResponseSchema::string())),
        ]);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "OBJECT");
        assert_eq!(json["properties"]["rating"]["type"], "STRING");
        assert_eq!(json["properties"]["rating"]["enum"][1], "Hold");
        assert_eq!(json["properties"]["keyPoints"]["type"], "ARRAY");
        assert_eq!(json["properties"]["keyPoints"]["items"]["type"], "STRING");
        assert!(json["properties"]["keyPoints"]["items"].get("enum").is_none());
    }

    #[test]
    fn test_request_body_carries_generation_config() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: "hi".to_string() }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: ResponseSchema::string(),
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "STRING");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"market."}]},"finishReason":"STOP"}]}"#,
        ).unwrap();
        assert_eq!(response.text(), "Hello, market.");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GeminiResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(response.text(), "");
    }
}
