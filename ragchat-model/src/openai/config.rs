//! Connection settings for OpenAI-style backends.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Settings for the OpenAI API or an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Overrides `https://api.openai.com/v1` for compatible endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), model: model.into(), organization_id: None, base_url: None }
    }

    /// Settings for an OpenAI-compatible endpoint at `base_url`.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self { base_url: Some(base_url.into()), ..Self::new(api_key, model) }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ModelError::Configuration("API key must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ModelError::Configuration("model name must not be empty".into()));
        }
        if self.base_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(ModelError::Configuration("base URL must not be empty".into()));
        }
        Ok(())
    }
}

/// Settings for an Azure OpenAI Service deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_base: String,
    pub api_version: String,
    pub deployment_id: String,
    pub api_key: String,
}

impl AzureConfig {
    pub fn new(
        api_base: impl Into<String>,
        api_version: impl Into<String>,
        deployment_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_version: api_version.into(),
            deployment_id: deployment_id.into(),
            api_key: api_key.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("api_base", &self.api_base),
            ("api_version", &self.api_version),
            ("deployment_id", &self.deployment_id),
            ("api_key", &self.api_key),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::Configuration(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}
