//! # ragchat-model
//!
//! Chat-model gateways for the ragchat assistant.
//!
//! ## Overview
//!
//! Every backend implements [`Generator`], which offers a streamed
//! completion ([`Generator::generate_stream`]) and a single-shot one
//! ([`Generator::generate`]):
//!
//! - [`OpenAIClient`] - OpenAI and OpenAI-compatible endpoints (feature `openai`)
//! - [`AzureOpenAIClient`] - Azure OpenAI Service deployments (feature `openai`)
//! - [`MockGenerator`] - scripted replies for tests and offline demos
//! - [`TimeoutGenerator`] - wraps any generator with a per-call deadline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use ragchat_model::{GenerationRequest, Generator, PromptMessage};
//! use ragchat_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::new(api_key, "gpt-4o-mini"))?;
//! let request = GenerationRequest::new(vec![PromptMessage::user("Hello")]);
//! let mut fragments = model.generate_stream(request).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! ```

pub mod error;
pub mod generator;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod request;
pub mod timeout;

pub use error::{ModelError, Result};
pub use generator::{FragmentStream, Generator};
pub use mock::{MockGenerator, MockReply};
#[cfg(feature = "openai")]
pub use openai::{AzureOpenAIClient, OpenAIClient};
pub use request::{GenerationConfig, GenerationRequest, PromptMessage, Role};
pub use timeout::TimeoutGenerator;
