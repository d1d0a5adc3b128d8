//! Follow-up question rewriting.

use std::sync::Arc;

use ragchat_model::{Generator, ModelError};
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::history::ConversationHistory;
use crate::prompt::contextualize_request;

/// Rewrites a follow-up question into one that stands on its own, using
/// the conversation so far.
#[derive(Clone)]
pub struct Contextualizer {
    generator: Arc<dyn Generator>,
}

impl Contextualizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Standalone form of `user_text` given `history`.
    ///
    /// With an empty history the input is returned as is and the model is
    /// not called.
    ///
    /// # Errors
    ///
    /// [`ChatError::Contextualization`] if the call fails or the rewrite is blank.
    pub async fn contextualize(
        &self,
        history: &ConversationHistory,
        user_text: &str,
    ) -> Result<String> {
        if history.is_empty() {
            return Ok(user_text.to_string());
        }

        let request = contextualize_request(history, user_text);
        let rewritten =
            self.generator.generate(request).await.map_err(ChatError::Contextualization)?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Err(ChatError::Contextualization(ModelError::EmptyResponse));
        }

        debug!(original = user_text, rewritten, "contextualized question");
        Ok(rewritten.to_string())
    }
}
