//! Chat-side configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Default number of messages kept in the conversation window.
pub const DEFAULT_MESSAGE_LIMIT: usize = 10;

/// Default deadline for a single model call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// What a turn does when the follow-up rewrite fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextualizeFallback {
    /// Log a warning and retrieve with the raw user text.
    #[default]
    FallbackToRaw,
    /// Abort the turn with [`ChatError::Contextualization`].
    Abort,
}

/// Settings for a chat session and its turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum number of messages kept in history (user and assistant alike).
    pub message_limit: usize,
    pub contextualize_fallback: ContextualizeFallback,
    /// Deadline applied to each model call.
    pub call_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_limit: DEFAULT_MESSAGE_LIMIT,
            contextualize_fallback: ContextualizeFallback::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ChatConfig {
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }
}

/// Builder for a validated [`ChatConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn message_limit(mut self, limit: usize) -> Self {
        self.config.message_limit = limit;
        self
    }

    pub fn contextualize_fallback(mut self, fallback: ContextualizeFallback) -> Self {
        self.config.contextualize_fallback = fallback;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] if `message_limit < 2` (a
    /// window must hold at least one full exchange) or `call_timeout` is zero.
    pub fn build(self) -> Result<ChatConfig> {
        if self.config.message_limit < 2 {
            return Err(ChatError::Configuration(format!(
                "message_limit ({}) must be at least 2",
                self.config.message_limit
            )));
        }
        if self.config.call_timeout.is_zero() {
            return Err(ChatError::Configuration("call_timeout must be positive".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ChatConfig::builder().build().unwrap();
        assert_eq!(config.message_limit, 10);
        assert_eq!(config.contextualize_fallback, ContextualizeFallback::FallbackToRaw);
        assert_eq!(config.call_timeout, Duration::from_secs(60));
    }

    #[test]
    fn rejects_windows_smaller_than_one_exchange() {
        assert!(ChatConfig::builder().message_limit(1).build().is_err());
        assert!(ChatConfig::builder().message_limit(2).build().is_ok());
        assert!(ChatConfig::builder().call_timeout(Duration::ZERO).build().is_err());
    }
}
