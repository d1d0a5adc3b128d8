//! Endpoint settings and gateway construction.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use ragchat_model::openai::OpenAIClient;
use ragchat_model::{Generator, ModelError};
use ragchat_retrieval::openai::DEFAULT_AZURE_API_VERSION;
use ragchat_retrieval::{AzureOpenAIEmbeddingProvider, EmbeddingProvider, RagError};

/// Default chat model deployed behind the inference endpoint.
pub const DEFAULT_CHAT_MODEL: &str = "tsuzumi-7b-202509";

/// Default embedding deployment.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Azure OpenAI embedding endpoint.
#[derive(Debug, Clone, Args)]
pub struct EmbeddingSettings {
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub openai_endpoint: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    #[arg(long, env = "AZURE_OPENAI_EMBEDDING_VERSION", default_value = DEFAULT_AZURE_API_VERSION)]
    pub embedding_version: String,

    /// Vector length produced by the embedding deployment
    #[arg(long, env = "AZURE_OPENAI_EMBEDDING_DIMENSIONS", default_value_t = 1536)]
    pub embedding_dimensions: usize,

    /// Seconds before an embedding request is abandoned
    #[arg(id = "embedding_timeout", long = "embedding-timeout", env = "RAGCHAT_EMBEDDING_TIMEOUT", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl EmbeddingSettings {
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>, RagError> {
        let endpoint = required(&self.openai_endpoint, "AZURE_OPENAI_ENDPOINT")
            .map_err(RagError::Configuration)?;
        let api_key = required(&self.openai_api_key, "AZURE_OPENAI_API_KEY")
            .map_err(RagError::Configuration)?;
        let timeout = positive_secs(self.timeout_secs).map_err(RagError::Configuration)?;
        if self.embedding_dimensions == 0 {
            return Err(RagError::Configuration("embedding dimensions must be positive".into()));
        }

        let provider = AzureOpenAIEmbeddingProvider::with_options(
            endpoint,
            api_key,
            self.embedding_model.as_str(),
            &self.embedding_version,
            timeout,
        )?
        .with_dimensions(self.embedding_dimensions);
        Ok(Arc::new(provider))
    }
}

/// OpenAI-compatible chat endpoint (Azure AI model inference).
#[derive(Debug, Clone, Args)]
pub struct GenerationSettings {
    #[arg(long, env = "AZURE_INFERENCE_ENDPOINT")]
    pub inference_endpoint: Option<String>,

    #[arg(long, env = "AZURE_INFERENCE_CREDENTIAL", hide_env_values = true)]
    pub inference_credential: Option<String>,

    #[arg(long, env = "AZURE_TSUZUMI_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    /// Seconds before a stalled model call is abandoned
    #[arg(id = "call_timeout", long = "call-timeout", env = "RAGCHAT_CALL_TIMEOUT", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl GenerationSettings {
    pub fn call_timeout(&self) -> Result<Duration, ModelError> {
        positive_secs(self.timeout_secs).map_err(ModelError::Configuration)
    }

    pub fn build(&self) -> Result<Arc<dyn Generator>, ModelError> {
        let endpoint = required(&self.inference_endpoint, "AZURE_INFERENCE_ENDPOINT")
            .map_err(ModelError::Configuration)?;
        let credential = required(&self.inference_credential, "AZURE_INFERENCE_CREDENTIAL")
            .map_err(ModelError::Configuration)?;

        let client = OpenAIClient::compatible(credential, endpoint, self.chat_model.as_str())?;
        Ok(Arc::new(client))
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("{name} is not set"))
}

fn positive_secs(secs: u64) -> Result<Duration, String> {
    if secs == 0 {
        return Err("timeouts must be at least one second".to_string());
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation(endpoint: Option<&str>, credential: Option<&str>) -> GenerationSettings {
        GenerationSettings {
            inference_endpoint: endpoint.map(str::to_string),
            inference_credential: credential.map(str::to_string),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout_secs: 60,
        }
    }

    #[test]
    fn missing_credentials_are_configuration_errors() {
        let err = generation(Some("https://x.inference.ai.azure.com"), None).build().err();
        assert!(matches!(err, Some(ModelError::Configuration(m)) if m.contains("AZURE_INFERENCE_CREDENTIAL")));

        let embedding = EmbeddingSettings {
            openai_endpoint: Some("  ".into()),
            openai_api_key: Some("key".into()),
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            embedding_version: DEFAULT_AZURE_API_VERSION.into(),
            embedding_dimensions: 1536,
            timeout_secs: 60,
        };
        assert!(matches!(embedding.build(), Err(RagError::Configuration(_))));
    }

    #[test]
    fn complete_settings_build_gateways() {
        let generator = generation(Some("https://x.inference.ai.azure.com"), Some("k")).build();
        assert_eq!(generator.unwrap().name(), DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut settings = generation(Some("https://x"), Some("k"));
        settings.timeout_secs = 0;
        assert!(settings.call_timeout().is_err());
    }
}
