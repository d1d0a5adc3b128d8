//! The retrieval-augmented chat turn.

use std::sync::Arc;

use futures::StreamExt;
use ragchat_model::{GenerationRequest, Generator, TimeoutGenerator};
use ragchat_retrieval::{RetrievedDocument, Retriever};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span, warn};

use crate::citation::{Citation, extract_citations};
use crate::config::{ChatConfig, ContextualizeFallback};
use crate::contextualizer::Contextualizer;
use crate::display::{ResponseDisplay, STREAMING_INDICATOR, TurnState};
use crate::error::{ChatError, Result};
use crate::history::ConversationHistory;
use crate::prompt::answer_request;
use crate::session::ChatSession;

/// The outcome of one committed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user_text: String,
    /// The question retrieval ran with, after contextualization.
    pub standalone_query: String,
    pub documents: Vec<RetrievedDocument>,
    pub response: String,
    pub citations: Vec<Citation>,
}

/// Runs chat turns: contextualize, retrieve, generate, cite, commit.
///
/// A turn that fails at any stage leaves the session history as it was.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = TurnOrchestrator::new(generator, retriever, &config);
/// let mut session = ChatSession::new(&config).with_index(index);
/// let turn = orchestrator.run_turn(&mut session, "What is the capital of France?", &mut NoopDisplay).await?;
/// println!("{}", render_citations(&turn.citations));
/// ```
#[derive(Clone)]
pub struct TurnOrchestrator {
    contextualizer: Contextualizer,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    fallback: ContextualizeFallback,
}

impl TurnOrchestrator {
    /// The same generator serves both the rewrite and the answer. Every
    /// call it makes is bounded by `config.call_timeout`.
    pub fn new(generator: Arc<dyn Generator>, retriever: Retriever, config: &ChatConfig) -> Self {
        let generator: Arc<dyn Generator> =
            Arc::new(TimeoutGenerator::new(generator, config.call_timeout));
        Self {
            contextualizer: Contextualizer::new(generator.clone()),
            retriever,
            generator,
            fallback: config.contextualize_fallback,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Run one turn for `user_text` and commit it to `session`.
    ///
    /// # Errors
    ///
    /// - [`ChatError::Contextualization`] if the rewrite fails and the
    ///   fallback policy is [`ContextualizeFallback::Abort`]
    /// - [`ChatError::Retrieval`] if no index is loaded, it is empty, or the
    ///   query cannot be embedded
    /// - [`ChatError::Generation`] if the answer call or its stream fails
    pub async fn run_turn(
        &self,
        session: &mut ChatSession,
        user_text: &str,
        display: &mut dyn ResponseDisplay,
    ) -> Result<Turn> {
        let span = info_span!(
            "rag.turn",
            session.id = %session.id(),
            history_len = session.history().len()
        );

        let result = self.run_stages(session, user_text, display).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| {
                warn!(error = %e, user_actionable = e.is_user_actionable(), "turn aborted");
            });
            display.on_abort(e);
            display.on_state(TurnState::Idle);
        }
        result
    }

    async fn run_stages(
        &self,
        session: &mut ChatSession,
        user_text: &str,
        display: &mut dyn ResponseDisplay,
    ) -> Result<Turn> {
        display.on_state(TurnState::Contextualizing);
        let standalone_query = self
            .contextualize(session.history(), user_text)
            .instrument(info_span!("rag.contextualize"))
            .await?;

        display.on_state(TurnState::Retrieving);
        let documents = self
            .retriever
            .retrieve(session.index(), &standalone_query)
            .instrument(info_span!(
                "rag.retrieve",
                top_k = self.retriever.top_k(),
                score_threshold = self.retriever.score_threshold()
            ))
            .await?;

        display.on_state(TurnState::Generating);
        let request = answer_request(session.history(), &documents, user_text);
        let response = self
            .stream_answer(request, display)
            .instrument(info_span!("rag.generate", documents = documents.len()))
            .await?;

        display.on_state(TurnState::Citing);
        let citations = info_span!("rag.cite").in_scope(|| extract_citations(&documents));
        display.on_citations(&citations);
        display.on_documents(&documents);

        info_span!("rag.commit").in_scope(|| {
            let history = session.history_mut();
            history.commit_exchange(user_text, response.as_str());
            info!(history_len = history.len(), citations = citations.len(), "turn committed");
        });
        display.on_state(TurnState::Committed);

        Ok(Turn {
            user_text: user_text.to_string(),
            standalone_query,
            documents,
            response,
            citations,
        })
    }

    async fn contextualize(&self, history: &ConversationHistory, user_text: &str) -> Result<String> {
        match self.contextualizer.contextualize(history, user_text).await {
            Ok(query) => Ok(query),
            Err(e) if self.fallback == ContextualizeFallback::FallbackToRaw => {
                warn!(error = %e, "contextualization failed; retrieving with the raw question");
                Ok(user_text.to_string())
            }
            Err(e) => Err(e),
        }
    }

    async fn stream_answer(
        &self,
        request: GenerationRequest,
        display: &mut dyn ResponseDisplay,
    ) -> Result<String> {
        let mut fragments =
            self.generator.generate_stream(request).await.map_err(ChatError::Generation)?;

        let mut response = String::new();
        let mut rendered = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment.map_err(ChatError::Generation)?;
            response.push_str(&fragment);

            rendered.clear();
            rendered.push_str(&response);
            rendered.push_str(STREAMING_INDICATOR);
            display.on_partial(&rendered);
        }

        // A stream that ends cleanly is an answer, even an empty one.
        if response.is_empty() {
            warn!("model streamed no text");
        }
        display.on_final(&response);
        Ok(response)
    }
}
