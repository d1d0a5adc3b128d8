//! OpenAI provider implementation for ragchat.
//!
//! This module provides chat clients for:
//! - the OpenAI API (`gpt-4o`, `gpt-4o-mini`, ...)
//! - OpenAI-compatible endpoints (Azure AI model inference, vLLM, Ollama, ...)
//! - Azure OpenAI Service deployments
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_model::openai::{AzureConfig, AzureOpenAIClient, OpenAIClient};
//!
//! // Any OpenAI-compatible chat endpoint
//! let chat = OpenAIClient::compatible(api_key, "https://my-endpoint/v1", "tsuzumi-7b")?;
//!
//! // Azure OpenAI deployment
//! let azure = AzureOpenAIClient::new(AzureConfig::new(
//!     "https://my-resource.openai.azure.com",
//!     "2024-05-01-preview",
//!     "gpt-4o-mini",
//!     api_key,
//! ))?;
//! ```

mod client;
mod config;
mod convert;

pub use client::{AzureOpenAIClient, OpenAIClient};
pub use config::{AzureConfig, OpenAIConfig};
