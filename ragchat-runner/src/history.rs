//! Bounded conversation history.

use std::collections::VecDeque;

use ragchat_model::PromptMessage;
use serde::{Deserialize, Serialize};

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    User(String),
    Assistant(String),
}

impl Message {
    pub fn text(&self) -> &str {
        match self {
            Self::User(text) | Self::Assistant(text) => text,
        }
    }

    pub fn to_prompt(&self) -> PromptMessage {
        match self {
            Self::User(text) => PromptMessage::user(text.clone()),
            Self::Assistant(text) => PromptMessage::assistant(text.clone()),
        }
    }
}

/// The most recent messages of a conversation, oldest first.
///
/// Holds at most `limit` messages. Exchanges are committed as a pair, and
/// the oldest messages are dropped once the window overflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    limit: usize,
}

impl ConversationHistory {
    /// Create an empty history holding at most `limit` messages.
    ///
    /// A limit below 2 is raised to 2 so a full exchange always fits.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(2);
        Self { messages: VecDeque::with_capacity(limit + 2), limit }
    }

    /// Append a completed exchange, then trim from the front.
    pub fn commit_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push_back(Message::User(user.into()));
        self.messages.push_back(Message::Assistant(assistant.into()));
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> impl ExactSizeIterator<Item = &Message> + DoubleEndedIterator {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn to_prompt_messages(&self) -> Vec<PromptMessage> {
        self.messages.iter().map(Message::to_prompt).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_messages_past_the_limit() {
        let mut history = ConversationHistory::new(4);
        history.commit_exchange("q1", "a1");
        history.commit_exchange("q2", "a2");
        history.commit_exchange("q3", "a3");

        let texts: Vec<&str> = history.messages().map(Message::text).collect();
        assert_eq!(texts, vec!["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn odd_limit_can_start_with_an_assistant_message() {
        let mut history = ConversationHistory::new(3);
        history.commit_exchange("q1", "a1");
        history.commit_exchange("q2", "a2");

        assert_eq!(history.len(), 3);
        assert_eq!(history.messages().next(), Some(&Message::Assistant("a1".into())));
    }

    #[test]
    fn clear_empties_the_window() {
        let mut history = ConversationHistory::new(10);
        history.commit_exchange("q", "a");
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.limit(), 10);
    }
}
