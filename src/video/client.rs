//! Transport for the Veo long-running generation API.

use crate::credentials::GeminiCredentials;
use crate::error::{parse_retry_after, sanitize_error_message, Result, VeoNodeError};
use crate::video::operation::Operation;
use crate::video::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default Gemini Developer API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Operations the node needs from the generation service.
#[async_trait]
pub trait VideoClient: Send + Sync {
    /// Submits a generation job and returns its initial operation state.
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation>;

    /// Re-fetches the state of a previously submitted operation.
    async fn poll(&self, operation: &Operation) -> Result<Operation>;

    /// Downloads a generated video from its URI.
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Builder for [`GeminiVideoClient`].
#[derive(Debug, Clone)]
pub struct GeminiVideoClientBuilder {
    credentials: GeminiCredentials,
    base_url: String,
    http: Option<reqwest::Client>,
}

impl GeminiVideoClientBuilder {
    /// Creates a builder using the given credentials.
    pub fn new(credentials: GeminiCredentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: None,
        }
    }

    /// Overrides the API endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Uses an existing HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Builds the client.
    pub fn build(self) -> GeminiVideoClient {
        GeminiVideoClient {
            http: self.http.unwrap_or_default(),
            credentials: self.credentials,
            base_url: self.base_url,
        }
    }
}

/// [`VideoClient`] backed by the Gemini Developer API.
#[derive(Debug, Clone)]
pub struct GeminiVideoClient {
    http: reqwest::Client,
    credentials: GeminiCredentials,
    base_url: String,
}

impl GeminiVideoClient {
    /// Creates a new `GeminiVideoClientBuilder`.
    pub fn builder(credentials: GeminiCredentials) -> GeminiVideoClientBuilder {
        GeminiVideoClientBuilder::new(credentials)
    }

    /// Returns the configured API endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_operation(&self, response: reqwest::Response) -> Result<Operation> {
        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl VideoClient for GeminiVideoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url,
            request.model.as_str(),
        );
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: &request.prompt,
            }],
        };

        let response = self
            .credentials
            .authenticate(self.http.post(&url))
            .json(&body)
            .send()
            .await?;

        let operation = self.read_operation(response).await?;
        tracing::debug!(
            operation = %operation.name,
            model = %request.model,
            done = operation.done,
            "submitted video generation request"
        );
        Ok(operation)
    }

    async fn poll(&self, operation: &Operation) -> Result<Operation> {
        let url = format!("{}/v1beta/{}", self.base_url, operation.name);
        let response = self
            .credentials
            .authenticate(self.http.get(&url))
            .send()
            .await?;
        self.read_operation(response).await
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        if uri.starts_with("gs://") {
            return Err(VeoNodeError::InvalidRequest(format!(
                "Veo returned a Google Cloud Storage URI ({uri}) which cannot be downloaded \
                 with an API key"
            )));
        }

        let response = self
            .credentials
            .authenticate(self.http.get(uri))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let bytes = response.bytes().await?;
        tracing::debug!(uri, size = bytes.len(), "downloaded generated video");
        Ok(bytes.to_vec())
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> VeoNodeError {
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return VeoNodeError::RateLimited { retry_after };
    }

    let message = serde_json::from_str::<ErrorEnvelope>(text)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| text.to_string());
    let message = sanitize_error_message(&message);

    if status == 401 || status == 403 {
        return VeoNodeError::Auth(message);
    }
    if status == 404 {
        return VeoNodeError::InvalidRequest(format!(
            "Veo API not available for this key or resource not found: {message}"
        ));
    }
    let lower = message.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return VeoNodeError::ContentBlocked(message);
    }
    VeoNodeError::Api { status, message }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}
