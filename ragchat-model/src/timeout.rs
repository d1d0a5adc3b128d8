//! Per-call deadlines at the gateway boundary.

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::time::timeout;
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::generator::{FragmentStream, Generator};
use crate::request::GenerationRequest;

/// Wraps a [`Generator`] so that no call can hang indefinitely.
///
/// The deadline applies to starting a stream, to the wait for each
/// following fragment, and to a whole non-streamed [`generate`](Generator::generate)
/// call. Expiry surfaces as [`ModelError::Timeout`].
pub struct TimeoutGenerator<G> {
    inner: G,
    limit: Duration,
}

impl<G: Generator> TimeoutGenerator<G> {
    pub fn new(inner: G, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

#[async_trait]
impl<G: Generator> Generator for TimeoutGenerator<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        let limit = self.limit;
        let model = self.inner.name().to_string();
        let mut fragments = timeout(limit, self.inner.generate_stream(request))
            .await
            .map_err(|_| {
                warn!(model = %model, ?limit, "model did not start streaming in time");
                ModelError::Timeout(limit)
            })??;

        let guarded = stream! {
            loop {
                match timeout(limit, fragments.next()).await {
                    Ok(Some(item)) => {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(model = %model, ?limit, "model stalled mid-stream");
                        yield Err(ModelError::Timeout(limit));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(guarded))
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        timeout(self.limit, self.inner.generate(request)).await.map_err(|_| {
            warn!(model = %self.inner.name(), limit = ?self.limit, "model call timed out");
            ModelError::Timeout(self.limit)
        })?
    }
}
