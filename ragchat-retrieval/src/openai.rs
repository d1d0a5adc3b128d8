//! OpenAI and Azure OpenAI embedding providers.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The default model for OpenAI embeddings.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// The default Azure OpenAI API version for embeddings.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// How a request authenticates against the endpoint.
enum Auth {
    Bearer(String),
    ApiKeyHeader(String),
}

/// Shared HTTP plumbing for both providers.
struct EmbeddingsEndpoint {
    provider: &'static str,
    client: reqwest::Client,
    url: String,
    auth: Auth,
}

impl EmbeddingsEndpoint {
    fn new(provider: &'static str, url: String, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RagError::Configuration(format!("{provider}: failed to build HTTP client: {e}"))
        })?;
        Ok(Self { provider, client, url, auth })
    }

    async fn post(&self, body: &EmbeddingRequest<'_>) -> Result<Vec<Vec<f32>>> {
        let request = self.client.post(&self.url).json(body);
        let request = match &self.auth {
            Auth::Bearer(key) => request.bearer_auth(key),
            Auth::ApiKeyHeader(key) => request.header("api-key", key),
        };

        let response = request.send().await.map_err(|e| {
            error!(provider = self.provider, error = %e, "request failed");
            RagError::embedding(self.provider, format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = self.provider, %status, "API error");
            return Err(RagError::embedding(
                self.provider,
                format!("API returned {status}: {detail}"),
            ));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = self.provider, error = %e, "failed to parse response");
            RagError::embedding(self.provider, format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != body.input.len() {
            return Err(RagError::embedding(
                self.provider,
                format!(
                    "requested {} embeddings, API returned {}",
                    body.input.len(),
                    parsed.data.len()
                ),
            ));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-3-small`.
/// - `dimensions` – optional Matryoshka dimension override.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_retrieval::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    endpoint: EmbeddingsEndpoint,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-3-small`) and dimensions (1536).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create a new provider whose HTTP requests time out after `timeout`.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Configuration("OpenAI API key must not be empty".into()));
        }

        Ok(Self {
            endpoint: EmbeddingsEndpoint::new(
                "OpenAI",
                OPENAI_EMBEDDINGS_URL.to_string(),
                Auth::Bearer(api_key),
                timeout,
            )?,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::Configuration("OPENAI_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensions (Matryoshka support).
    ///
    /// When set, the API returns embeddings truncated to this size.
    /// This also updates the value returned by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("OpenAI", "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "OpenAI", batch_size = texts.len(), model = %self.model, "embedding batch");

        let body = EmbeddingRequest {
            model: Some(&self.model),
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };
        self.endpoint.post(&body).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An [`EmbeddingProvider`] backed by an Azure OpenAI embedding deployment.
///
/// Requests go to
/// `{endpoint}/openai/deployments/{deployment}/embeddings?api-version={version}`
/// and authenticate with the `api-key` header.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_retrieval::openai::AzureOpenAIEmbeddingProvider;
///
/// let provider = AzureOpenAIEmbeddingProvider::new(
///     "https://my-resource.openai.azure.com",
///     "my-key",
///     "text-embedding-3-small",
/// )?;
/// ```
pub struct AzureOpenAIEmbeddingProvider {
    endpoint: EmbeddingsEndpoint,
    deployment: String,
    dimensions: usize,
}

impl AzureOpenAIEmbeddingProvider {
    /// Create a provider for `deployment` using the default API version and timeout.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Result<Self> {
        Self::with_options(endpoint, api_key, deployment, DEFAULT_AZURE_API_VERSION, DEFAULT_TIMEOUT)
    }

    /// Create a provider with an explicit API version and request timeout.
    pub fn with_options(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        let deployment = deployment.into();
        if endpoint.is_empty() || api_key.is_empty() {
            return Err(RagError::Configuration(
                "Azure OpenAI endpoint and API key must not be empty".into(),
            ));
        }

        let url = format!(
            "{}/openai/deployments/{deployment}/embeddings?api-version={api_version}",
            endpoint.trim_end_matches('/')
        );
        Ok(Self {
            endpoint: EmbeddingsEndpoint::new(
                "AzureOpenAI",
                url,
                Auth::ApiKeyHeader(api_key),
                timeout,
            )?,
            deployment,
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Declare the dimensionality of the deployed model.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        "AzureOpenAI"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("AzureOpenAI", "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "AzureOpenAI",
            batch_size = texts.len(),
            deployment = %self.deployment,
            "embedding batch"
        );

        let body = EmbeddingRequest { model: None, input: texts.to_vec(), dimensions: None };
        self.endpoint.post(&body).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credentials_are_configuration_errors() {
        assert!(matches!(OpenAIEmbeddingProvider::new(""), Err(RagError::Configuration(_))));
        assert!(matches!(
            AzureOpenAIEmbeddingProvider::new("", "key", "embedding"),
            Err(RagError::Configuration(_))
        ));
    }

    #[test]
    fn azure_url_includes_deployment_and_version() {
        let provider = AzureOpenAIEmbeddingProvider::new(
            "https://example.openai.azure.com/",
            "key",
            "text-embedding-3-small",
        )
        .unwrap();
        assert_eq!(
            provider.endpoint.url,
            "https://example.openai.azure.com/openai/deployments/text-embedding-3-small/embeddings?api-version=2024-12-01-preview"
        );
    }
}
