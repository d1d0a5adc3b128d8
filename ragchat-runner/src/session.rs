//! Per-conversation state.

use std::path::Path;
use std::sync::Arc;

use ragchat_retrieval::{RagError, VectorIndex};
use tracing::info;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::history::ConversationHistory;

/// One user's conversation: its id, bounded history, and the index it
/// answers from.
///
/// Turns borrow the session mutably, so a session runs one turn at a time.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    history: ConversationHistory,
    index: Option<Arc<VectorIndex>>,
}

impl ChatSession {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            history: ConversationHistory::new(config.message_limit),
            index: None,
        }
    }

    pub fn with_index(mut self, index: Arc<VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_deref()
    }

    pub fn set_index(&mut self, index: Arc<VectorIndex>) {
        self.index = Some(index);
    }

    /// Load the persisted index at `location` and answer from it from now on.
    ///
    /// On failure the previous index (if any) stays in place.
    pub fn load_index(&mut self, location: impl AsRef<Path>) -> Result<&VectorIndex, RagError> {
        let index = VectorIndex::load(location.as_ref())?;
        info!(session.id = %self.id, entries = index.len(), "index attached to session");
        let index: &VectorIndex = self.index.insert(Arc::new(index));
        Ok(index)
    }

    /// Forget the conversation so far. The index stays loaded.
    pub fn clear_history(&mut self) {
        self.history.clear();
        info!(session.id = %self.id, "history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_get_distinct_ids() {
        let config = ChatConfig::default();
        assert_ne!(ChatSession::new(&config).id(), ChatSession::new(&config).id());
    }

    #[test]
    fn failed_load_keeps_session_without_index() {
        let mut session = ChatSession::new(&ChatConfig::default());
        let err = session.load_index("/nonexistent/ragchat-index").unwrap_err();
        assert!(err.is_missing_index());
        assert!(session.index().is_none());
    }

    #[test]
    fn clear_history_keeps_the_index_and_id() {
        let mut session = ChatSession::new(&ChatConfig::default());
        let id = session.id().to_string();
        session.history_mut().commit_exchange("q", "a");
        session.clear_history();
        assert!(session.history().is_empty());
        assert_eq!(session.id(), id);
    }
}
