//! Scripted generator for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::generator::{FragmentStream, Generator};
use crate::request::GenerationRequest;

/// One scripted answer of a [`MockGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockReply {
    fragments: Vec<String>,
    /// Fail with a stream error after emitting every fragment.
    fail_with: Option<String>,
    /// Refuse the call outright.
    reject_with: Option<String>,
    delay: Option<Duration>,
}

impl MockReply {
    /// Reply with the given fragments, in order.
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_with: None,
            reject_with: None,
            delay: None,
        }
    }

    /// Reply with `text` as a single fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::fragments([text.into()])
    }

    /// Emit the given fragments, then break the stream with `message`.
    pub fn fail_after<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fail_with: Some(message.into()), ..Self::fragments(fragments) }
    }

    /// Fail the call before any fragment is produced.
    pub fn reject(message: impl Into<String>) -> Self {
        Self { reject_with: Some(message.into()), ..Self::fragments(Vec::<String>::new()) }
    }

    /// Sleep this long before each fragment.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A [`Generator`] that plays back queued [`MockReply`]s and records
/// every request it receives.
///
/// Calls beyond the scripted replies fail with [`ModelError::Request`].
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_model::{MockGenerator, MockReply};
///
/// let model = MockGenerator::new()
///     .with_reply(MockReply::text("standalone question"))
///     .with_reply(MockReply::fragments(["Paris ", "is the capital."]));
/// ```
#[derive(Debug, Default)]
pub struct MockGenerator {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue another reply.
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.push_reply(reply);
        self
    }

    /// Queue another reply on a shared generator.
    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push_back(reply);
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| ModelError::Request("no scripted reply left".to_string()))?;

        if let Some(message) = reply.reject_with {
            return Err(ModelError::Request(message));
        }

        let MockReply { fragments, fail_with, delay, .. } = reply;
        let fragments = stream! {
            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(fragment);
            }
            if let Some(message) = fail_with {
                yield Err(ModelError::Stream(message));
            }
        };
        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::request::PromptMessage;

    fn request(text: &str) -> GenerationRequest {
        GenerationRequest::new(vec![PromptMessage::user(text)])
    }

    #[tokio::test]
    async fn plays_replies_in_order_and_records_requests() {
        let model = MockGenerator::new()
            .with_reply(MockReply::text("first"))
            .with_reply(MockReply::fragments(["sec", "ond"]));

        assert_eq!(model.generate(request("a")).await.unwrap(), "first");
        assert_eq!(model.generate(request("b")).await.unwrap(), "second");
        assert!(model.generate(request("c")).await.is_err());

        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests()[1].last_user_text(), Some("b"));
    }

    #[tokio::test]
    async fn fail_after_emits_fragments_then_error() {
        let model = MockGenerator::new().with_reply(MockReply::fail_after(["partial"], "reset"));
        let items: Vec<_> = model.generate_stream(request("q")).await.unwrap().collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(ModelError::Stream(_))));
    }

    #[tokio::test]
    async fn rejected_call_fails_before_streaming() {
        let model = MockGenerator::new().with_reply(MockReply::reject("unauthorized"));
        assert!(matches!(model.generate_stream(request("q")).await, Err(ModelError::Request(_))));
    }

    #[tokio::test]
    async fn empty_reply_is_an_error_for_generate() {
        let model = MockGenerator::new().with_reply(MockReply::fragments(Vec::<String>::new()));
        assert!(matches!(model.generate(request("q")).await, Err(ModelError::EmptyResponse)));
    }
}
