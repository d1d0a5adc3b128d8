//! The generation gateway trait.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::{ModelError, Result};
use crate::request::GenerationRequest;

/// A lazy, finite, non-restartable sequence of text fragments.
///
/// Each item is the next piece of the answer; a failed item ends the
/// answer. Fragments are pulled one at a time with
/// [`StreamExt::next`](futures::StreamExt::next).
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A chat model that turns a prompt into text.
///
/// Backends implement [`generate_stream`](Generator::generate_stream). The
/// default [`generate`](Generator::generate) drains that stream into one
/// string; backends with a cheaper non-streaming call can override it.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model or deployment name, for logs.
    fn name(&self) -> &str;

    /// Start a completion and return its fragments as they arrive.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream>;

    /// Run a completion to the end and return the whole text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyResponse`] if the model produced no text.
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let mut fragments = self.generate_stream(request).await?;
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment?);
        }
        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        (**self).generate_stream(request).await
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        (**self).generate(request).await
    }
}
