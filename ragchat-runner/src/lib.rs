//! # ragchat-runner
//!
//! Conversation state and the chat turn of the ragchat assistant.
//!
//! ## Overview
//!
//! A turn moves through [`TurnState`]s:
//!
//! 1. **Contextualizing** - a follow-up is rewritten into a standalone question
//! 2. **Retrieving** - the question is matched against the session's index
//! 3. **Generating** - the answer streams to a [`ResponseDisplay`]
//! 4. **Citing** - one [`Citation`] per distinct document source
//! 5. **Committed** - the exchange is appended to the bounded history
//!
//! Any failure aborts the turn and leaves the history unchanged.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat_runner::{ChatConfig, ChatSession, NoopDisplay, TurnOrchestrator};
//!
//! let config = ChatConfig::default();
//! let orchestrator = TurnOrchestrator::new(generator, retriever, &config);
//! let mut session = ChatSession::new(&config);
//! session.load_index("vector_store")?;
//!
//! let turn = orchestrator.run_turn(&mut session, "What is RAG?", &mut NoopDisplay).await?;
//! ```

pub mod citation;
pub mod config;
pub mod contextualizer;
pub mod display;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod session;

pub use citation::{Citation, extract_citations, render_citations};
pub use config::{ChatConfig, ChatConfigBuilder, ContextualizeFallback};
pub use contextualizer::Contextualizer;
pub use display::{
    DisplayEvent, NoopDisplay, RecordingDisplay, ResponseDisplay, STREAMING_INDICATOR, TurnState,
};
pub use error::{ChatError, Result};
pub use history::{ConversationHistory, Message};
pub use orchestrator::{Turn, TurnOrchestrator};
pub use session::ChatSession;
