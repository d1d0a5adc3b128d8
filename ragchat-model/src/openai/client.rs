//! OpenAI chat clients.

use async_openai::{
    Client,
    config::{AzureConfig as AsyncAzureConfig, Config, OpenAIConfig as AsyncOpenAIConfig},
};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use super::config::{AzureConfig, OpenAIConfig};
use super::convert;
use crate::error::{ModelError, Result};
use crate::generator::{FragmentStream, Generator};
use crate::request::GenerationRequest;

/// OpenAI client for the standard OpenAI API and OpenAI-compatible APIs.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        config.validate()?;
        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self { client: Client::with_config(openai_config), model: config.model })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }
}

#[async_trait]
impl Generator for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        stream_chat(&self.client, &self.model, "OpenAI", &request).await
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        complete_chat(&self.client, &self.model, "OpenAI", &request).await
    }
}

/// Azure OpenAI client.
pub struct AzureOpenAIClient {
    client: Client<AsyncAzureConfig>,
    deployment_id: String,
}

impl AzureOpenAIClient {
    /// Create a new Azure OpenAI client.
    pub fn new(config: AzureConfig) -> Result<Self> {
        config.validate()?;
        let azure_config = AsyncAzureConfig::new()
            .with_api_base(&config.api_base)
            .with_api_version(&config.api_version)
            .with_deployment_id(&config.deployment_id)
            .with_api_key(&config.api_key);

        Ok(Self { client: Client::with_config(azure_config), deployment_id: config.deployment_id })
    }
}

#[async_trait]
impl Generator for AzureOpenAIClient {
    fn name(&self) -> &str {
        &self.deployment_id
    }

    // Azure routes on the deployment, so it doubles as the model name.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        stream_chat(&self.client, &self.deployment_id, "Azure OpenAI", &request).await
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        complete_chat(&self.client, &self.deployment_id, "Azure OpenAI", &request).await
    }
}

async fn stream_chat<C>(
    client: &Client<C>,
    model: &str,
    provider: &'static str,
    request: &GenerationRequest,
) -> Result<FragmentStream>
where
    C: Config + Send + Sync + 'static,
{
    let openai_request = convert::build_request(model, request, true)?;
    debug!(provider, model, messages = openai_request.messages.len(), "starting chat stream");

    let mut chunks = client
        .chat()
        .create_stream(openai_request)
        .await
        .map_err(|e| ModelError::Request(format!("{provider} API error: {e}")))?;

    let stream = try_stream! {
        while let Some(result) = chunks.next().await {
            let chunk = result.map_err(|e| ModelError::Stream(format!("{provider} stream error: {e}")))?;
            if let Some(fragment) = convert::fragment_from_chunk(&chunk) {
                yield fragment;
            }
        }
    };

    Ok(Box::pin(stream))
}

async fn complete_chat<C>(
    client: &Client<C>,
    model: &str,
    provider: &'static str,
    request: &GenerationRequest,
) -> Result<String>
where
    C: Config + Send + Sync + 'static,
{
    let openai_request = convert::build_request(model, request, false)?;
    debug!(provider, model, messages = openai_request.messages.len(), "requesting chat completion");

    let response = client
        .chat()
        .create(openai_request)
        .await
        .map_err(|e| ModelError::Request(format!("{provider} API error: {e}")))?;

    let text: String =
        response.choices.iter().filter_map(|choice| choice.message.content.as_deref()).collect();
    if text.trim().is_empty() { Err(ModelError::EmptyResponse) } else { Ok(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_reject_blank_credentials() {
        assert!(OpenAIClient::compatible("", "https://example.com/v1", "m").is_err());
        let azure = AzureConfig::new("https://r.openai.azure.com", "2024-05-01-preview", "", "k");
        assert!(AzureOpenAIClient::new(azure).is_err());
    }

    #[test]
    fn azure_client_is_named_after_its_deployment() {
        let azure = AzureConfig::new("https://r.openai.azure.com", "2024-05-01-preview", "gpt-4o", "k");
        let client = AzureOpenAIClient::new(azure).unwrap();
        assert_eq!(client.name(), "gpt-4o");
    }
}
