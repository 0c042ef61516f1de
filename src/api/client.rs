//! HTTP implementation of [`CurriculumApi`]
//!
//! Every call is a single request against `{base_url}/api/v1`. The client
//! attaches `X-API-Key` when configured and turns non-2xx responses into
//! [`TequilaError::Api`] with the backend's own message.

use crate::api::types::*;
use crate::api::CurriculumApi;
use crate::config::ApiConfig;
use crate::error::{Result, TequilaError};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Path prefix of every REST endpoint
const API_PREFIX: &str = "/api/v1";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP client for the curriculum backend
///
/// # Examples
///
/// ```
/// use tequila::api::ApiClient;
/// use tequila::config::ApiConfig;
///
/// let config = ApiConfig {
///     base_url: "http://localhost:8000".to_string(),
///     api_key: Some("secret".to_string()),
///     request_timeout_seconds: None,
/// };
/// let client = ApiClient::new(&config).unwrap();
/// assert_eq!(client.base_url(), "http://localhost:8000");
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    /// Create a client from explicit connection settings
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("tequila/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TequilaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            "Initialized API client: base_url={}, api_key={}",
            config.base_url,
            if config.api_key.is_some() { "set" } else { "unset" }
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured API key
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, endpoint)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.url(endpoint))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key.as_str());
        }
        req
    }

    /// Send a request and reject non-2xx responses
    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let response = req.send().await.map_err(|e| {
            tracing::warn!("Request to backend failed: {}", e);
            TequilaError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T> {
        tracing::debug!("{} {}", method, endpoint);
        let mut req = self.request(method, endpoint);
        if let Some(body) = body {
            req = req.body(body.to_string());
        }

        let response = self.send(req).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TequilaError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", endpoint, e);
            TequilaError::Serialization(e).into()
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.call(Method::GET, endpoint, None).await
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.call(Method::POST, endpoint, None).await
    }
}

/// Build an API error from a failed response
///
/// The message is taken from the JSON body's `detail` or `message`,
/// falling back to the HTTP status text.
pub async fn error_from_response(response: Response) -> TequilaError {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("API request failed")
        .to_string();

    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| extract_error_message(&v))
            .unwrap_or(fallback),
        Err(_) => fallback,
    };

    tracing::debug!("Backend returned {}: {}", status, message);
    TequilaError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Pull a human-readable message out of an error body
///
/// Accepts `{"detail": "..."}`, `{"detail": {"message": "..."}}` and
/// `{"message": "..."}`.
pub fn extract_error_message(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Object(obj)) => {
            if let Some(Value::String(s)) = obj.get("message") {
                return Some(s.clone());
            }
        }
        _ => {}
    }
    match body.get("message") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl CurriculumApi for ApiClient {
    async fn list_weeks(&self) -> Result<WeekListResponse> {
        self.get("/weeks").await
    }

    async fn scaffold_week(&self, week: u32) -> Result<MessageResponse> {
        self.post(&format!("/weeks/{}/scaffold", week)).await
    }

    async fn validate_week(&self, week: u32) -> Result<ValidationResult> {
        self.post(&format!("/weeks/{}/validate", week)).await
    }

    async fn export_week(&self, week: u32) -> Result<ExportResponse> {
        self.post(&format!("/weeks/{}/export", week)).await
    }

    async fn download_week_export(&self, week: u32) -> Result<Bytes> {
        let endpoint = format!("/weeks/{}/export/download", week);
        tracing::debug!("GET {}", endpoint);
        let mut req = self.client.get(self.url(&endpoint));
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key.as_str());
        }
        let response = self.send(req).await?;
        response
            .bytes()
            .await
            .map_err(|e| TequilaError::Transport(e.to_string()).into())
    }

    async fn get_week_spec_part(&self, week: u32, part: &str) -> Result<SpecPart> {
        self.get(&format!("/weeks/{}/spec/parts/{}", week, part))
            .await
    }

    async fn get_compiled_week_spec(&self, week: u32) -> Result<CompiledWeekSpec> {
        self.get(&format!("/weeks/{}/spec/compiled", week)).await
    }

    async fn get_day_field(&self, week: u32, day: u32, field: &str) -> Result<FieldContent> {
        self.get(&format!("/weeks/{}/days/{}/fields/{}", week, day, field))
            .await
    }

    async fn update_day_field(
        &self,
        week: u32,
        day: u32,
        field: &str,
        content: Value,
    ) -> Result<MessageResponse> {
        self.call(
            Method::PUT,
            &format!("/weeks/{}/days/{}/fields/{}", week, day, field),
            Some(json!({ "content": content })),
        )
        .await
    }

    async fn get_day_flint_bundle(&self, week: u32, day: u32) -> Result<FlintBundle> {
        self.get(&format!("/weeks/{}/days/{}/flint-bundle", week, day))
            .await
    }

    async fn generate_week_spec(&self, week: u32) -> Result<MessageResponse> {
        self.post(&format!("/gen/weeks/{}/spec", week)).await
    }

    async fn generate_role_context(&self, week: u32) -> Result<MessageResponse> {
        self.post(&format!("/gen/weeks/{}/role-context", week)).await
    }

    async fn generate_assets(&self, week: u32) -> Result<MessageResponse> {
        self.post(&format!("/gen/weeks/{}/assets", week)).await
    }

    async fn generate_day_fields(&self, week: u32, day: u32) -> Result<MessageResponse> {
        self.post(&format!("/gen/weeks/{}/days/{}/fields", week, day))
            .await
    }

    async fn generate_day_document(&self, week: u32, day: u32) -> Result<MessageResponse> {
        self.post(&format!("/gen/weeks/{}/days/{}/document", week, day))
            .await
    }

    async fn hydrate_week(&self, week: u32) -> Result<WeekHydrationResult> {
        self.post(&format!("/gen/weeks/{}/hydrate", week)).await
    }

    async fn get_usage(&self) -> Result<UsageStats> {
        self.get("/usage").await
    }

    async fn reset_usage(&self) -> Result<MessageResponse> {
        self.post("/usage/reset").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            api_key: None,
            request_timeout_seconds: None,
        }
    }

    #[test]
    fn test_url_joins_prefix_and_trims_slash() {
        let client = ApiClient::new(&config("http://localhost:8000/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.url("/weeks/1/spec/compiled"),
            "http://localhost:8000/api/v1/weeks/1/spec/compiled"
        );
    }

    #[test]
    fn test_extract_detail_string() {
        let body = json!({"detail": "not found"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("not found"));
    }

    #[test]
    fn test_extract_detail_object_message() {
        let body = json!({"detail": {"message": "Week validation failed", "errors": []}});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("Week validation failed")
        );
    }

    #[test]
    fn test_extract_message_field() {
        let body = json!({"message": "bad key"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("bad key"));
    }

    #[test]
    fn test_extract_prefers_detail_over_message() {
        let body = json!({"detail": "first", "message": "second"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("first"));
    }

    #[test]
    fn test_extract_nothing_useful() {
        assert!(extract_error_message(&json!({"error": true})).is_none());
        assert!(extract_error_message(&json!([1, 2])).is_none());
    }
}
